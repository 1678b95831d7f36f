use pocket_core::Event;

/// Single capability every bus subscriber implements
///
/// Handlers take `&self`; subscribers that keep state use interior
/// mutability, which lets a handler publish (and so be re-entered) while it
/// is running.
pub trait Subscriber {
    /// React to one event
    ///
    /// Errors are logged by the bus and never reach the publisher.
    fn handle(&self, event: &Event) -> anyhow::Result<()>;

    /// Name used in failure logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Subscriber for F
where
    F: Fn(&Event) -> anyhow::Result<()>,
{
    fn handle(&self, event: &Event) -> anyhow::Result<()> {
        self(event)
    }
}
