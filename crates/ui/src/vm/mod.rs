mod flow_vm;
mod registration_vm;

pub use flow_vm::{
    ModulePhase, ModuleRunnerVm, PreTestVm, module_payload, parse_restart_query, stage_body,
    view_error_from_flow,
};
pub use registration_vm::{RegistrationForm, view_error_from_registration};
