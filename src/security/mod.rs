pub mod command_executor;
pub mod otp;

pub use command_executor::{
    CommandArg, CommandError, CommandOutput, SafeCommandExecutor, render_command,
};
pub use otp::{OTP_MASK, Otp};
