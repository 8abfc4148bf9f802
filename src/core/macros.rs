//! Macros for cutting state boilerplate.

/// Declare unit states whose lifecycle hooks do nothing.
///
/// Many states exist purely as a classification: they observe nothing and
/// have no entry/exit side effects of their own (often because an ancestor
/// carries the behavior). This macro writes the empty [`State`](crate::State)
/// impl for them.
///
/// # Example
///
/// ```
/// use demeanor::plain_state;
///
/// plain_state! {
///     pub struct Offline;
///     pub struct Online;
/// }
///
/// let registry = demeanor::StateRegistry::builder()
///     .state(|| Offline)
///     .state(|| Online)
///     .build()
///     .unwrap();
/// ```
#[macro_export]
macro_rules! plain_state {
    (
        $(
            $(#[$meta:meta])*
            $vis:vis struct $name:ident;
        )+
    ) => {
        $(
            $(#[$meta])*
            $vis struct $name;

            impl $crate::State for $name {
                fn did_enter(&self, _machine: &$crate::Machine) {}
                fn did_exit(&self, _machine: &$crate::Machine) {}
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use crate::core::state::StateKey;

    plain_state! {
        struct Standby;
        /// A documented state.
        pub(crate) struct Engaged;
    }

    #[test]
    fn generated_states_have_keys() {
        assert_eq!(StateKey::of::<Standby>().name(), "Standby");
        assert_eq!(StateKey::of::<Engaged>().name(), "Engaged");
    }
}
