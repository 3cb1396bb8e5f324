/// Subscription to pointer-move events over the displayed image.
///
/// Only the inspector session calls these, and only on eyedropper activation
/// and deactivation.
#[cfg_attr(test, mockall::automock)]
pub trait PointerListener: Send + Sync {
    fn attach(&mut self);

    fn detach(&mut self);
}
