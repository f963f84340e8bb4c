use ledgefall_engine::LedgeId;

/// Exactly one state is active per fighter. The held ledge lives inside the
/// `Hanging` variant, so a fighter can only reference a ledge while hanging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MachineState {
    Airborne,
    Idle,
    Running,
    Shielding,
    Stunned,
    Rolling,
    SpotDodging,
    AirDodging,
    Hanging { ledge: LedgeId },
}

impl MachineState {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Airborne => "airborne",
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Shielding => "shielding",
            Self::Stunned => "stunned",
            Self::Rolling => "rolling",
            Self::SpotDodging => "spot_dodging",
            Self::AirDodging => "air_dodging",
            Self::Hanging { .. } => "hanging",
        }
    }

    pub(crate) fn hanging_on(self) -> Option<LedgeId> {
        match self {
            Self::Hanging { ledge } => Some(ledge),
            _ => None,
        }
    }

    /// States in which a grounded jump press is ignored.
    pub(crate) fn blocks_ground_jump(self) -> bool {
        matches!(
            self,
            Self::Stunned | Self::Rolling | Self::SpotDodging | Self::Hanging { .. }
        )
    }

    /// States in which directional input adds no acceleration at all.
    pub(crate) fn blocks_movement(self) -> bool {
        matches!(
            self,
            Self::Stunned | Self::Shielding | Self::Rolling | Self::Hanging { .. }
        )
    }
}
