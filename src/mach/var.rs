use super::{Type, Val, ARRAY_LIMIT};
use crate::error;
use crate::lang::Error;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Inclusive bounds of one array dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dim {
    pub lower: i32,
    pub upper: i32,
}

impl Dim {
    pub fn new(lower: i32, upper: i32) -> Dim {
        Dim { lower, upper }
    }
    fn len(&self) -> usize {
        (self.upper as i64 - self.lower as i64 + 1) as usize
    }
}

/// Undeclared arrays behave as if dimensioned 0 to 10.
const IMPLICIT_DIM: Dim = Dim {
    lower: 0,
    upper: 10,
};

/// ## Variable memory
///
/// One stack slot. A slot holds a scalar, or when it carries a dimension
/// vector, an array whose backing store grows lazily as elements are
/// written. Elements are addressed row-major.

#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    ty: Type,
    dims: Option<Rc<[Dim]>>,
    val: Val,
    elems: Vec<Val>,
}

impl Default for Var {
    fn default() -> Var {
        Var {
            ty: Type::Any,
            dims: None,
            val: Val::Null,
            elems: vec![],
        }
    }
}

impl Var {
    pub fn new(ty: Type) -> Var {
        Var {
            val: ty.zero(),
            ty,
            dims: None,
            elems: vec![],
        }
    }

    /// A slot holding `val` and typed by it.
    pub fn fresh(val: Val) -> Var {
        Var {
            ty: val.ty(),
            dims: None,
            val,
            elems: vec![],
        }
    }

    pub fn array(ty: Type, dims: Vec<Dim>) -> Result<Var> {
        let mut total: usize = 1;
        for dim in &dims {
            if dim.lower > dim.upper {
                return Err(error!(SubscriptOutOfRange));
            }
            total = match total.checked_mul(dim.len()) {
                Some(t) if t <= ARRAY_LIMIT => t,
                _ => return Err(error!(OutOfMemory; "ARRAY TOO LARGE")),
            };
        }
        if dims.is_empty() {
            return Err(error!(InternalError; "NO DIMENSIONS"));
        }
        Ok(Var {
            val: Val::Null,
            ty,
            dims: Some(dims.into()),
            elems: vec![],
        })
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn dims(&self) -> Option<&[Dim]> {
        self.dims.as_deref()
    }

    pub fn is_array(&self) -> bool {
        self.dims.is_some()
    }

    pub fn value(&self) -> &Val {
        &self.val
    }

    /// Number of elements the dimension vector describes.
    pub fn len(&self) -> usize {
        match &self.dims {
            Some(dims) => dims.iter().map(|d| d.len()).product(),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major linear offset of a subscript list.
    pub fn offset(&self, index: &[i32]) -> Result<usize> {
        match &self.dims {
            Some(dims) => linearize(dims, index),
            None => linearize(&vec![IMPLICIT_DIM; index.len()], index),
        }
    }

    pub fn element(&self, offset: usize) -> Val {
        match self.elems.get(offset) {
            Some(v) => v.clone(),
            None => self.ty.zero(),
        }
    }

    pub fn set_element(&mut self, offset: usize, val: Val) -> Result<()> {
        let val = self.ty.coerce(val)?;
        let slot = self.element_mut(offset)?;
        *slot = val;
        Ok(())
    }

    fn element_mut(&mut self, offset: usize) -> Result<&mut Val> {
        if offset >= self.len() {
            return Err(error!(SubscriptOutOfRange));
        }
        if offset >= self.elems.len() {
            let ty = &self.ty;
            self.elems.resize_with(offset + 1, || ty.zero());
        }
        match self.elems.get_mut(offset) {
            Some(v) => Ok(v),
            None => Err(error!(InternalError; "ELEMENT")),
        }
    }

    fn implicit_dims(&mut self, count: usize) {
        if self.dims.is_none() {
            self.dims = Some(vec![IMPLICIT_DIM; count].into());
            self.val = Val::Null;
        }
    }

    pub fn get(&self, index: Option<&[i32]>, field: Option<&[usize]>) -> Result<Val> {
        let field = field.unwrap_or(&[]);
        match index {
            Some(index) => {
                let offset = self.offset(index)?;
                match self.elems.get(offset) {
                    Some(v) => Ok(v.field(field)?.clone()),
                    None => Ok(self.ty.zero().field(field)?.clone()),
                }
            }
            None => {
                if self.is_array() {
                    return Err(error!(InternalError; "ARRAY WITHOUT SUBSCRIPT"));
                }
                Ok(self.val.field(field)?.clone())
            }
        }
    }

    pub fn set(&mut self, index: Option<&[i32]>, field: Option<&[usize]>, val: Val) -> Result<()> {
        let ty = self.ty.clone();
        let target = match index {
            Some(index) => {
                self.implicit_dims(index.len());
                let offset = self.offset(index)?;
                self.element_mut(offset)?
            }
            None => {
                if self.is_array() {
                    return Err(error!(InternalError; "ARRAY WITHOUT SUBSCRIPT"));
                }
                &mut self.val
            }
        };
        match field {
            Some(path) if !path.is_empty() => {
                let (slot, ty) = target.field_mut(path)?;
                *slot = ty.coerce(val)?;
            }
            _ => {
                *target = ty.coerce(val)?;
            }
        }
        Ok(())
    }

    /// LBOUND and UBOUND. Dimensions count from 1.
    pub fn bound(&self, dim: usize, upper: bool) -> Result<i32> {
        let dims = match &self.dims {
            Some(dims) => dims,
            None => return Err(error!(SubscriptOutOfRange)),
        };
        match dim.checked_sub(1).and_then(|d| dims.get(d)) {
            Some(d) if upper => Ok(d.upper),
            Some(d) => Ok(d.lower),
            None => Err(error!(SubscriptOutOfRange)),
        }
    }
}

fn linearize(dims: &[Dim], index: &[i32]) -> Result<usize> {
    if dims.len() != index.len() {
        return Err(error!(SubscriptOutOfRange));
    }
    let mut offset = 0;
    for (dim, i) in dims.iter().zip(index) {
        if *i < dim.lower || *i > dim.upper {
            return Err(error!(SubscriptOutOfRange));
        }
        offset = offset * dim.len() + (*i - dim.lower) as usize;
    }
    Ok(offset)
}
