use super::LineNumber;

#[derive(Clone, PartialEq)]
pub struct Error {
    code: u16,
    line_number: LineNumber,
    message: &'static str,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code: code as u16,
            line_number: None,
            message: "",
        }
    }

    /// An error raised by the `ERROR n` statement. Any code is accepted.
    pub fn user(code: u16) -> Error {
        Error {
            code,
            line_number: None,
            message: "",
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code as u16
    }

    pub fn line_number(&self) -> LineNumber {
        self.line_number
    }

    pub fn detail(&self) -> &'static str {
        self.message
    }

    /// Internal errors and the cancellation sentinel can never be trapped
    /// by ON ERROR.
    pub fn is_recoverable(&self) -> bool {
        !self.is(ErrorCode::InternalError) && !self.is(ErrorCode::Break)
    }

    pub fn in_line_number(&self, line: LineNumber) -> Error {
        Error {
            code: self.code,
            line_number: line,
            message: self.message,
        }
    }

    pub fn message(&self, message: &'static str) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        Error {
            code: self.code,
            line_number: self.line_number,
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Break = 0,
    SyntaxError = 2,
    ReturnWithoutGosub = 3,
    OutOfData = 4,
    IllegalFunctionCall = 5,
    Overflow = 6,
    OutOfMemory = 7,
    UndefinedLine = 8,
    SubscriptOutOfRange = 9,
    RedimensionedArray = 10,
    DivisionByZero = 11,
    TypeMismatch = 13,
    StringTooLong = 15,
    ResumeWithoutError = 20,
    OutOfStackSpace = 28,
    InternalError = 51,
    InputPastEnd = 62,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let code_str = match self.code {
            0 => "BREAK",
            1 => "NEXT WITHOUT FOR",
            2 => "SYNTAX ERROR",
            3 => "RETURN WITHOUT GOSUB",
            4 => "OUT OF DATA",
            5 => "ILLEGAL FUNCTION CALL",
            6 => "OVERFLOW",
            7 => "OUT OF MEMORY",
            8 => "UNDEFINED LINE",
            9 => "SUBSCRIPT OUT OF RANGE",
            10 => "REDIMENSIONED ARRAY",
            11 => "DIVISION BY ZERO",
            12 => "ILLEGAL DIRECT",
            13 => "TYPE MISMATCH",
            14 => "OUT OF STRING SPACE",
            15 => "STRING TOO LONG",
            16 => "STRING FORMULA TOO COMPLEX",
            17 => "CAN'T CONTINUE",
            18 => "UNDEFINED USER FUNCTION",
            19 => "NO RESUME",
            20 => "RESUME WITHOUT ERROR",
            21 => "UNPRINTABLE ERROR",
            22 => "MISSING OPERAND",
            23 => "LINE BUFFER OVERFLOW",
            26 => "FOR WITHOUT NEXT",
            28 => "OUT OF STACK SPACE",
            29 => "WHILE WITHOUT WEND",
            30 => "WEND WITHOUT WHILE",
            51 => "INTERNAL ERROR",
            62 => "INPUT PAST END",
            _ => "",
        };
        let mut suffix = String::new();
        if let Some(line_number) = self.line_number {
            suffix.push_str(&format!(" {}", line_number));
        }
        let detail = if self.message.is_empty() {
            String::new()
        } else {
            format!("; {}", self.message)
        };
        if code_str.is_empty() {
            if suffix.is_empty() {
                write!(f, "PROGRAM ERROR {}{}", self.code, detail)
            } else {
                write!(f, "PROGRAM ERROR {} IN{}{}", self.code, suffix, detail)
            }
        } else if suffix.is_empty() {
            write!(f, "{}{}", code_str, detail)
        } else {
            write!(f, "{} IN{}{}", code_str, suffix, detail)
        }
    }
}
