use ledgefall_engine::{RenderTarget, SpriteDraw, Vec2};

pub(crate) const PARTICLE_RENDER_ORDER: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EffectKind {
    DoubleJump,
    Stun,
    RunTurn,
}

impl EffectKind {
    pub(crate) fn lifetime_frames(self) -> u32 {
        match self {
            Self::DoubleJump => 20,
            Self::Stun => 30,
            Self::RunTurn => 15,
        }
    }

    fn sprite_key(self) -> &'static str {
        match self {
            Self::DoubleJump => "fx/double_jump",
            Self::Stun => "fx/stun",
            Self::RunTurn => "fx/run_turn",
        }
    }

    fn fallback_half_extents(self) -> Vec2 {
        match self {
            Self::DoubleJump => Vec2::new(30.0, 10.0),
            Self::Stun => Vec2::new(8.0, 8.0),
            Self::RunTurn => Vec2::new(12.0, 6.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EffectRequest {
    pub(crate) kind: EffectKind,
    pub(crate) position: Vec2,
    pub(crate) facing_right: bool,
}

/// Fire-and-forget sink for cosmetic effects raised during a tick.
#[derive(Debug, Default)]
pub(crate) struct EffectQueue {
    requests: Vec<EffectRequest>,
}

impl EffectQueue {
    pub(crate) fn emit(&mut self, kind: EffectKind, position: Vec2, facing_right: bool) {
        self.requests.push(EffectRequest {
            kind,
            position,
            facing_right,
        });
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = EffectRequest> + '_ {
        self.requests.drain(..)
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> &[EffectRequest] {
        &self.requests
    }

    pub(crate) fn clear(&mut self) {
        self.requests.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Particle {
    kind: EffectKind,
    position: Vec2,
    facing_right: bool,
    age: u32,
}

impl Particle {
    pub(crate) fn from_request(request: EffectRequest) -> Self {
        Self {
            kind: request.kind,
            position: request.position,
            facing_right: request.facing_right,
            age: 0,
        }
    }

    pub(crate) fn update(&mut self) {
        self.age = self.age.saturating_add(1);
    }

    pub(crate) fn is_expired(&self) -> bool {
        self.age >= self.kind.lifetime_frames()
    }

    pub(crate) fn alpha(&self) -> f64 {
        let lifetime = self.kind.lifetime_frames().max(1) as f64;
        (1.0 - self.age as f64 / lifetime).clamp(0.0, 1.0)
    }

    pub(crate) fn render(&self, target: &mut dyn RenderTarget) {
        target.draw_sprite(
            SpriteDraw::new(
                self.kind.sprite_key(),
                self.position,
                self.kind.fallback_half_extents(),
            )
            .facing(self.facing_right)
            .with_alpha(self.alpha()),
        );
    }
}
