use derive_more::Display;

/// The status a command reports back to the client.
///
/// The numeric values are part of the wire protocol, `arborc` exits with them.
#[derive(Display, Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    #[display(fmt = "success")]
    Success = 0,
    #[display(fmt = "error")]
    Error = 1,
    #[display(fmt = "command not found")]
    CommandNotFound = 2,
    #[display(fmt = "invalid argument")]
    InvalidArgument = 3,
    #[display(fmt = "setting not found")]
    SettingNotFound = 4,
    #[display(fmt = "tag in use")]
    TagInUse = 5,
    #[display(fmt = "forbidden")]
    Forbidden = 6,
    #[display(fmt = "no parameter expected")]
    NoParameterExpected = 7,
    #[display(fmt = "environment variable unset")]
    EnvUnset = 8,
    #[display(fmt = "need more arguments")]
    NeedMoreArgs = 9,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map a raw status back, anything unknown is a generic error
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            2 => Self::CommandNotFound,
            3 => Self::InvalidArgument,
            4 => Self::SettingNotFound,
            5 => Self::TagInUse,
            6 => Self::Forbidden,
            7 => Self::NoParameterExpected,
            8 => Self::EnvUnset,
            9 => Self::NeedMoreArgs,
            _ => Self::Error,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.code()
    }
}
