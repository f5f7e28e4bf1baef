/// Decides whether the current caller may use the plugin.
///
/// The host supplies its own policy; [`AllowAllGuard`] admits everyone.
pub trait InvocationGuard: Send + Sync {
    /// Returns a reason when the call must be refused.
    fn deny_reason(&self) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllGuard;

impl InvocationGuard for AllowAllGuard {
    fn deny_reason(&self) -> Option<String> {
        None
    }
}
