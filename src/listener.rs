/// Receives notifications from a [`PackageManager`](crate::PackageManager)
/// as packages come and go. Every method does nothing by default.
pub trait PackageListener {
    /// A package with menu items finished initializing.
    fn menu_added(&mut self, _identifier: &str, _name: &str, _items: &[String]) {}

    /// A package that had menu items was disabled or finalized.
    fn menu_removed(&mut self, _identifier: &str) {}

    /// A package reported an error, or was disabled because of one.
    fn error_message(&mut self, _identifier: &str, _name: &str, _msg: &str) {}
}
