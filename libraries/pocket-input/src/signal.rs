/// Raw hardware signals, as sampled by the poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSignal {
    /// Button contact closed
    ButtonDown,
    /// Button contact opened
    ButtonUp,
    /// Quadrature detents since the last sample; positive is physical clockwise
    Rotary { steps: i32 },
}
