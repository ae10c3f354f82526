//! Start cycle as an explicit state machine.
//!
//! [`transition`] is pure: given a finished state and what the run has learned
//! so far, it names the next state and the effects to perform there. The
//! [`Orchestrator`](crate::Orchestrator) only executes effects.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartState {
    CheckingLegacy,
    LoadingConfig,
    DetectingChange,
    Reconfiguring,
    BringingUpDb,
    BringingUpApp,
    ConfiguringApp,
    CleaningUp,
    Done,
    Failed,
}

impl StartState {
    pub const INITIAL: StartState = StartState::CheckingLegacy;

    pub fn is_terminal(self) -> bool {
        matches!(self, StartState::Done | StartState::Failed)
    }

    /// Effects performed while in this state.
    pub fn effects(self, facts: Facts) -> Vec<Effect> {
        let recreate = facts.reconfigure;
        match self {
            StartState::CheckingLegacy => vec![Effect::CheckLegacyInstall],
            StartState::LoadingConfig => vec![
                Effect::LoadConfig,
                Effect::EnsureIndexFile,
                Effect::WriteComposeFile,
            ],
            StartState::DetectingChange => vec![Effect::DetectChange],
            StartState::Reconfiguring => vec![
                Effect::StopAll,
                Effect::RemoveDataVolume,
                Effect::PullAll,
            ],
            StartState::BringingUpDb => vec![
                Effect::BringUpDatabase { recreate },
                Effect::WriteRewriteRules,
            ],
            StartState::BringingUpApp => vec![Effect::BringUpApplication { recreate }],
            StartState::ConfiguringApp => vec![
                Effect::AwaitDatabase,
                Effect::ConfigureSite,
                Effect::CommitChecksum,
            ],
            StartState::CleaningUp => vec![Effect::RemoveGeneratedFiles],
            StartState::Done => vec![Effect::ReportStatus],
            StartState::Failed => Vec::new(),
        }
    }

    /// Progress message shown while the state runs.
    pub fn description(self) -> &'static str {
        match self {
            StartState::CheckingLegacy => "Checking for a legacy install",
            StartState::LoadingConfig => "Loading configuration",
            StartState::DetectingChange => "Detecting configuration changes",
            StartState::Reconfiguring => "Removing old containers and pulling images",
            StartState::BringingUpDb => "Starting the database",
            StartState::BringingUpApp => "Starting WordPress",
            StartState::ConfiguringApp => "Configuring WordPress",
            StartState::CleaningUp => "Cleaning up generated files",
            StartState::Done => "Reading environment status",
            StartState::Failed => "Failed",
        }
    }
}

impl fmt::Display for StartState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StartState::CheckingLegacy => "checking_legacy",
            StartState::LoadingConfig => "loading_config",
            StartState::DetectingChange => "detecting_change",
            StartState::Reconfiguring => "reconfiguring",
            StartState::BringingUpDb => "bringing_up_db",
            StartState::BringingUpApp => "bringing_up_app",
            StartState::ConfiguringApp => "configuring_app",
            StartState::CleaningUp => "cleaning_up",
            StartState::Done => "done",
            StartState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    CheckLegacyInstall,
    LoadConfig,
    EnsureIndexFile,
    WriteComposeFile,
    /// Computes the checksum and sets [`Facts::reconfigure`].
    DetectChange,
    StopAll,
    RemoveDataVolume,
    PullAll,
    BringUpDatabase { recreate: bool },
    WriteRewriteRules,
    BringUpApplication { recreate: bool },
    AwaitDatabase,
    ConfigureSite,
    CommitChecksum,
    RemoveGeneratedFiles,
    ReportStatus,
}

/// What the run has established so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Facts {
    /// The configuration changed since the last provisioning, or an update was forced.
    pub reconfigure: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: StartState,
    pub effects: Vec<Effect>,
}

/// Successor of a completed `state`. Terminal states map to themselves with no effects.
pub fn transition(state: StartState, facts: Facts) -> Transition {
    let next = match state {
        StartState::CheckingLegacy => StartState::LoadingConfig,
        StartState::LoadingConfig => StartState::DetectingChange,
        StartState::DetectingChange if facts.reconfigure => StartState::Reconfiguring,
        StartState::DetectingChange | StartState::Reconfiguring => StartState::BringingUpDb,
        StartState::BringingUpDb => StartState::BringingUpApp,
        StartState::BringingUpApp if facts.reconfigure => StartState::ConfiguringApp,
        StartState::BringingUpApp | StartState::ConfiguringApp => StartState::CleaningUp,
        StartState::CleaningUp => StartState::Done,
        StartState::Done | StartState::Failed => {
            return Transition {
                next: state,
                effects: Vec::new(),
            }
        }
    };
    Transition {
        next,
        effects: next.effects(facts),
    }
}
