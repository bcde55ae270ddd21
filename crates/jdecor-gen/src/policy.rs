use std::collections::HashSet;

use jdecor_classfile::access::{
    ACC_FINAL, ACC_NATIVE, ACC_PRIVATE, ACC_PROTECTED, ACC_PUBLIC, ACC_STATIC,
};
use jdecor_classfile::ClassMember;

use crate::hierarchy::OBJECT;

pub const CONSTRUCTOR_NAME: &str = "<init>";

const FINALIZER_NAME: &str = "finalize";
const FINALIZER_DESCRIPTOR: &str = "()V";

/// What to do with one candidate member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Emit a delegating override.
    Generate,
    /// Emit the store-the-delegate constructor.
    RouteConstructor,
    /// Final on a type other than the universal root; the decorator silently
    /// falls back to the wrapped type's behavior at call sites.
    SkipFinal,
    /// Final, static, private or native — never overridable.
    SkipUnamendable,
    /// A more-derived declaration was already handled, or the constructor was
    /// already emitted.
    SkipDuplicate,
    /// The `finalize()V` lifecycle hook.
    SkipLifecycleHook,
}

/// Mutable state of one generation run, owned by the assembler.
#[derive(Debug, Default)]
pub struct GenerationState {
    /// `(name, descriptor)` pairs already regenerated; first occurrence in
    /// hierarchy-walk order wins.
    pub visited: HashSet<(String, String)>,
    pub constructor_emitted: bool,
    /// Class currently streaming its members, for diagnostics.
    pub visiting: String,
}

/// Decide what to do with `member`, declared on the class named by
/// `state.visiting`. Rules are evaluated in order; `Generate` records the
/// member in `state.visited`.
pub fn classify(member: &ClassMember, state: &mut GenerationState) -> Action {
    let is_final = member.access_flags & ACC_FINAL != 0;
    if is_final && state.visiting != OBJECT {
        return Action::SkipFinal;
    }
    if member.access_flags & (ACC_FINAL | ACC_STATIC | ACC_PRIVATE | ACC_NATIVE) != 0 {
        return Action::SkipUnamendable;
    }
    if member.name == CONSTRUCTOR_NAME {
        if state.constructor_emitted {
            return Action::SkipDuplicate;
        }
        state.constructor_emitted = true;
        return Action::RouteConstructor;
    }
    let key = (member.name.clone(), member.descriptor.clone());
    if state.visited.contains(&key) {
        return Action::SkipDuplicate;
    }
    if member.name == FINALIZER_NAME && member.descriptor == FINALIZER_DESCRIPTOR {
        return Action::SkipLifecycleHook;
    }
    state.visited.insert(key);
    Action::Generate
}

/// Visibility of a generated member: protected stays protected, everything
/// else widens to public. Package-private and private never survive onto an
/// override.
pub fn effective_access(access_flags: u16) -> u16 {
    if access_flags & ACC_PROTECTED != 0 {
        ACC_PROTECTED
    } else {
        ACC_PUBLIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jdecor_classfile::access::ACC_ABSTRACT;

    fn member(access_flags: u16, name: &str, descriptor: &str) -> ClassMember {
        ClassMember {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            ..ClassMember::default()
        }
    }

    fn state_at(visiting: &str) -> GenerationState {
        GenerationState {
            visiting: visiting.to_string(),
            ..GenerationState::default()
        }
    }

    #[test]
    fn final_on_intermediate_class_is_reported_distinctly() {
        let mut state = state_at("com/x/Base");
        let action = classify(&member(ACC_PUBLIC | ACC_FINAL, "locked", "()V"), &mut state);
        assert_eq!(action, Action::SkipFinal);
    }

    #[test]
    fn final_on_root_is_unamendable() {
        let mut state = state_at(OBJECT);
        let action = classify(&member(ACC_PUBLIC | ACC_FINAL, "wait", "()V"), &mut state);
        assert_eq!(action, Action::SkipUnamendable);
    }

    #[test]
    fn static_private_native_are_unamendable() {
        for flags in [ACC_STATIC, ACC_PRIVATE, ACC_NATIVE] {
            let mut state = state_at("com/x/A");
            let action = classify(&member(flags, "m", "()V"), &mut state);
            assert_eq!(action, Action::SkipUnamendable);
        }
    }

    #[test]
    fn first_constructor_routes_then_duplicates_skip() {
        let mut state = state_at("com/x/A");
        assert_eq!(
            classify(&member(ACC_PUBLIC, "<init>", "()V"), &mut state),
            Action::RouteConstructor
        );
        assert_eq!(
            classify(&member(ACC_PUBLIC, "<init>", "(I)V"), &mut state),
            Action::SkipDuplicate
        );
    }

    #[test]
    fn revisited_signature_is_skipped() {
        let mut state = state_at("com/x/A");
        assert_eq!(classify(&member(ACC_PUBLIC, "m", "()V"), &mut state), Action::Generate);
        state.visiting = "com/x/Base".to_string();
        assert_eq!(
            classify(&member(ACC_PUBLIC | ACC_ABSTRACT, "m", "()V"), &mut state),
            Action::SkipDuplicate
        );
    }

    #[test]
    fn overloads_are_distinct() {
        let mut state = state_at("com/x/A");
        assert_eq!(classify(&member(ACC_PUBLIC, "m", "()V"), &mut state), Action::Generate);
        assert_eq!(classify(&member(ACC_PUBLIC, "m", "(I)V"), &mut state), Action::Generate);
    }

    #[test]
    fn finalizer_hook_is_skipped() {
        let mut state = state_at(OBJECT);
        assert_eq!(
            classify(&member(ACC_PROTECTED, "finalize", "()V"), &mut state),
            Action::SkipLifecycleHook
        );
        // Overloads of the name are ordinary methods.
        let mut state = state_at("com/x/A");
        assert_eq!(
            classify(&member(ACC_PUBLIC, "finalize", "(I)V"), &mut state),
            Action::Generate
        );
    }

    #[test]
    fn access_widens_to_public_unless_protected() {
        assert_eq!(effective_access(0), ACC_PUBLIC);
        assert_eq!(effective_access(ACC_PUBLIC | ACC_ABSTRACT), ACC_PUBLIC);
        assert_eq!(effective_access(ACC_PROTECTED), ACC_PROTECTED);
    }
}
