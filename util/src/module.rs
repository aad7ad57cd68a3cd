//! # Cyclic module interface
//!
//! Processing stages run by a control loop implement [`State`]: they are built once from their
//! parameters and then called once per cycle with that cycle's inputs.

/// A cyclic processing module.
pub trait State: Sized {
    /// Data used to build the module, usually its parameters
    type InitData;
    type InitError;

    /// Inputs for one cycle
    type InputData;
    /// Outputs of one cycle
    type OutputData;
    /// Diagnostics describing what happened during one cycle
    type StatusReport;
    type ProcError;

    /// Build the module from its initialisation data.
    fn init(init_data: Self::InitData) -> Result<Self, Self::InitError>;

    /// Run one cycle, returning the outputs and a status report.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
