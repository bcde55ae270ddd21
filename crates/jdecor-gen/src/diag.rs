use crate::policy::Action;

/// Why a member was left out of the generated decorator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Final on a non-root type; callers fall through to the wrapped type's
    /// own behavior.
    Final,
    /// Final on the root, static, private or native.
    Unamendable,
    Duplicate,
    LifecycleHook,
}

impl SkipReason {
    pub fn from_action(action: Action) -> Option<Self> {
        match action {
            Action::SkipFinal => Some(SkipReason::Final),
            Action::SkipUnamendable => Some(SkipReason::Unamendable),
            Action::SkipDuplicate => Some(SkipReason::Duplicate),
            Action::SkipLifecycleHook => Some(SkipReason::LifecycleHook),
            Action::Generate | Action::RouteConstructor => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::Final => "final",
            SkipReason::Unamendable => "unamendable",
            SkipReason::Duplicate => "duplicate",
            SkipReason::LifecycleHook => "lifecycle-hook",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMember {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub reason: SkipReason,
}

/// Collects the run's non-fatal events as values.
///
/// Skips are facts about the produced artifact, not process state, so they
/// travel with the run rather than through a global logger; `tracing`
/// carries the same events as ambient logs for operators.
#[derive(Debug, Default)]
pub struct DiagnosticsSink {
    events: Vec<SkippedMember>,
}

impl DiagnosticsSink {
    pub fn record(&mut self, event: SkippedMember) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[SkippedMember] {
        &self.events
    }

    /// The warning-grade subset: members the decorator cannot amend and
    /// silently leaves to the wrapped type.
    pub fn warnings(&self) -> impl Iterator<Item = &SkippedMember> {
        self.events.iter().filter(|e| e.reason == SkipReason::Final)
    }
}
