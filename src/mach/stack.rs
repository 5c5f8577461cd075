use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Auto-growing and size limited vector
///
/// Reads past the end see nothing; writes past the end grow the vector
/// with default values. Growth beyond the limit is OUT OF MEMORY.

pub struct Stack<T> {
    overflow_message: &'static str,
    limit: usize,
    vec: Vec<T>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.vec)
    }
}

impl<T: Default> Stack<T> {
    pub fn new(overflow_message: &'static str, limit: usize) -> Stack<T> {
        Stack {
            overflow_message,
            limit,
            vec: vec![],
        }
    }
    fn overflow_check(&self, len: usize) -> Result<()> {
        if len > self.limit {
            Err(error!(OutOfMemory; self.overflow_message))
        } else {
            Ok(())
        }
    }
    pub fn clear(&mut self) {
        self.vec.clear()
    }
    pub fn len(&self) -> usize {
        self.vec.len()
    }
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }
    pub fn truncate(&mut self, len: usize) {
        self.vec.truncate(len)
    }
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.vec.get(idx)
    }
    /// Mutable access that grows the stack when `idx` is past the end.
    pub fn get_mut(&mut self, idx: usize) -> Result<&mut T> {
        if idx >= self.vec.len() {
            self.overflow_check(idx + 1)?;
            self.vec.resize_with(idx + 1, T::default);
        }
        match self.vec.get_mut(idx) {
            Some(t) => Ok(t),
            None => Err(error!(InternalError; "UNDERFLOW")),
        }
    }
    pub fn push(&mut self, val: T) -> Result<()> {
        self.overflow_check(self.vec.len() + 1)?;
        self.vec.push(val);
        Ok(())
    }
}
