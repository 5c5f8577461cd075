use super::{Address, FRAME_LIMIT};
use crate::error;
use crate::lang::Error;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Module,
    Gosub,
    Sub,
    Function,
}

/// ## Activation record
///
/// A frame borrows its parent by index. `params` maps formal argument
/// positions to the absolute stack index of the caller's variable; those
/// relative addresses never reach the frame's own storage. `result` is
/// where a FUNCTION frame delivers its value.

#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: FrameKind,
    pub parent: Option<usize>,
    pub pc: Address,
    pub offset: usize,
    pub params: Rc<[usize]>,
    pub result: Option<usize>,
}

/// ## Frame arena
///
/// Frames live in a vector and are strictly LIFO, so unwinding to the
/// module frame is a truncate.

#[derive(Debug)]
pub struct Frames {
    frames: Vec<Frame>,
    current: usize,
}

impl Frames {
    pub fn new(module_offset: usize) -> Frames {
        Frames {
            frames: vec![Frame {
                kind: FrameKind::Module,
                parent: None,
                pc: 0,
                offset: module_offset,
                params: Rc::from(vec![]),
                result: None,
            }],
            current: 0,
        }
    }

    pub fn current(&self) -> &Frame {
        &self.frames[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Frame {
        &mut self.frames[self.current]
    }

    pub fn depth(&self) -> usize {
        self.current
    }

    pub fn push(
        &mut self,
        kind: FrameKind,
        pc: Address,
        offset: usize,
        params: Rc<[usize]>,
        result: Option<usize>,
    ) -> Result<()> {
        if self.frames.len() >= FRAME_LIMIT {
            return Err(error!(OutOfStackSpace));
        }
        self.frames.truncate(self.current + 1);
        self.frames.push(Frame {
            kind,
            parent: Some(self.current),
            pc,
            offset,
            params,
            result,
        });
        self.current = self.frames.len() - 1;
        Ok(())
    }

    /// Replace the current frame with its parent.
    pub fn pop(&mut self) -> Result<Frame> {
        let parent = match self.current().parent {
            Some(parent) => parent,
            None => return Err(error!(InternalError; "POP OF MODULE FRAME")),
        };
        self.frames.truncate(self.current + 1);
        let frame = self.frames.pop();
        self.frames.truncate(parent + 1);
        self.current = parent;
        frame.ok_or_else(|| error!(InternalError; "FRAME UNDERFLOW"))
    }

    /// Drop every frame above the module frame.
    pub fn unwind(&mut self) {
        self.frames.truncate(1);
        self.current = 0;
    }

    /// Walk the parent chain from the current frame.
    pub fn chain(&self) -> impl Iterator<Item = &Frame> {
        let mut next = Some(self.current);
        std::iter::from_fn(move || {
            let idx = next?;
            let frame = &self.frames[idx];
            next = frame.parent;
            Some(frame)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_unwind() {
        let mut f = Frames::new(4);
        f.push(FrameKind::Sub, 10, 20, Rc::from(vec![5]), None).unwrap();
        f.push(FrameKind::Gosub, 30, 20, Rc::from(vec![5]), None).unwrap();
        assert_eq!(f.depth(), 2);
        assert_eq!(f.current().parent, Some(1));
        let kinds: Vec<FrameKind> = f.chain().map(|fr| fr.kind).collect();
        assert_eq!(
            kinds,
            vec![FrameKind::Gosub, FrameKind::Sub, FrameKind::Module]
        );
        assert_eq!(f.pop().unwrap().pc, 30);
        assert_eq!(f.current().pc, 10);
        f.unwind();
        assert_eq!(f.current().kind, FrameKind::Module);
        assert_eq!(f.current().offset, 4);
        assert!(f.pop().is_err());
    }

    #[test]
    fn test_frame_limit() {
        let mut f = Frames::new(0);
        let mut result = Ok(());
        for _ in 0..FRAME_LIMIT {
            result = f.push(FrameKind::Gosub, 0, 0, Rc::from(vec![]), None);
            if result.is_err() {
                break;
            }
        }
        assert!(result.unwrap_err().is(crate::lang::ErrorCode::OutOfStackSpace));
    }
}
