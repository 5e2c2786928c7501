//! The builtin operator table.

/// Declarations registered by [`Registry::standard`](super::Registry::standard).
///
/// Order matters: overloads of one name are tried top to bottom.
pub const STANDARD_DECLARATIONS: &[&str] = &[
    // arithmetic
    "add(Tensor self, Tensor other) -> Tensor",
    "add(Tensor self, number other) -> Tensor",
    "add(int a, int b) -> int",
    "add(float a, float b) -> float",
    "add(int a, float b) -> float",
    "add(float a, int b) -> float",
    "add(str a, str b) -> str",
    "add(t[] a, t[] b) -> t[]",
    "sub(Tensor self, Tensor other) -> Tensor",
    "sub(Tensor self, number other) -> Tensor",
    "sub(int a, int b) -> int",
    "sub(float a, float b) -> float",
    "sub(int a, float b) -> float",
    "sub(float a, int b) -> float",
    "mul(Tensor self, Tensor other) -> Tensor",
    "mul(Tensor self, number other) -> Tensor",
    "mul(int a, int b) -> int",
    "mul(float a, float b) -> float",
    "mul(int a, float b) -> float",
    "mul(float a, int b) -> float",
    "div(Tensor self, Tensor other) -> Tensor",
    "div(Tensor self, number other) -> Tensor",
    "div(int a, int b) -> float",
    "div(float a, float b) -> float",
    "div(int a, float b) -> float",
    "div(float a, int b) -> float",
    "floordiv(int a, int b) -> int",
    "floordiv(float a, float b) -> float",
    "remainder(Tensor self, number other) -> Tensor",
    "remainder(int a, int b) -> int",
    "remainder(float a, float b) -> float",
    "pow(Tensor self, Tensor exponent) -> Tensor",
    "pow(Tensor self, number exponent) -> Tensor",
    "pow(float a, float b) -> float",
    "pow(int a, int b) -> float",
    "matmul(Tensor self, Tensor other) -> Tensor",
    "neg(Tensor self) -> Tensor",
    "neg(int a) -> int",
    "neg(float a) -> float",
    // comparison
    "eq(Tensor self, Tensor other) -> Tensor",
    "eq(Tensor self, number other) -> Tensor",
    "eq(int a, int b) -> bool",
    "eq(float a, float b) -> bool",
    "eq(int a, float b) -> bool",
    "eq(float a, int b) -> bool",
    "eq(bool a, bool b) -> bool",
    "eq(str a, str b) -> bool",
    "ne(Tensor self, Tensor other) -> Tensor",
    "ne(Tensor self, number other) -> Tensor",
    "ne(int a, int b) -> bool",
    "ne(float a, float b) -> bool",
    "ne(bool a, bool b) -> bool",
    "ne(str a, str b) -> bool",
    "lt(Tensor self, Tensor other) -> Tensor",
    "lt(Tensor self, number other) -> Tensor",
    "lt(int a, int b) -> bool",
    "lt(float a, float b) -> bool",
    "lt(int a, float b) -> bool",
    "lt(float a, int b) -> bool",
    "gt(Tensor self, Tensor other) -> Tensor",
    "gt(Tensor self, number other) -> Tensor",
    "gt(int a, int b) -> bool",
    "gt(float a, float b) -> bool",
    "gt(int a, float b) -> bool",
    "gt(float a, int b) -> bool",
    "le(Tensor self, Tensor other) -> Tensor",
    "le(int a, int b) -> bool",
    "le(float a, float b) -> bool",
    "ge(Tensor self, Tensor other) -> Tensor",
    "ge(int a, int b) -> bool",
    "ge(float a, float b) -> bool",
    // logic
    "__and__(bool a, bool b) -> bool",
    "__and__(Tensor self, Tensor other) -> Tensor",
    "__or__(bool a, bool b) -> bool",
    "__or__(Tensor self, Tensor other) -> Tensor",
    "__xor__(bool a, bool b) -> bool",
    "__xor__(Tensor self, Tensor other) -> Tensor",
    "__not__(bool a) -> bool",
    "__is__(t1 self, t2 obj) -> bool",
    "__isnot__(t1 self, t2 obj) -> bool",
    // indexing
    "select(Tensor self, int dim, int index) -> Tensor",
    "select(t[] list, int idx) -> t",
    "slice(Tensor self, int dim=0, int start=0, int end=9223372036854775807, int step=1) -> Tensor",
    "slice(t[] l, int start, int end=9223372036854775807, int step=1) -> t[]",
    "index(Tensor self, Tensor[] indices) -> Tensor",
    "unsqueeze(Tensor self, int dim) -> Tensor",
    "index_put_(Tensor self, Tensor[] indices, Tensor values) -> Tensor",
    "copy_(Tensor self, Tensor src) -> Tensor",
    "_set_item(t[] l, int idx, t el) -> t[]",
    // in-place
    "add_(Tensor self, Tensor other) -> Tensor",
    "add_(Tensor self, number other) -> Tensor",
    "sub_(Tensor self, Tensor other) -> Tensor",
    "sub_(Tensor self, number other) -> Tensor",
    "mul_(Tensor self, Tensor other) -> Tensor",
    "mul_(Tensor self, number other) -> Tensor",
    "div_(Tensor self, Tensor other) -> Tensor",
    "div_(Tensor self, number other) -> Tensor",
    // casts
    "Int(Tensor a) -> int",
    "Int(float a) -> int",
    "Int(bool a) -> int",
    "Float(Tensor a) -> float",
    "Float(int a) -> float",
    "Float(bool a) -> float",
    "Bool(Tensor a) -> bool",
    "Bool(int a) -> bool",
    "Bool(float a) -> bool",
    "_cast_Byte(Tensor self, bool non_blocking=False) -> Tensor",
    "_cast_Char(Tensor self, bool non_blocking=False) -> Tensor",
    "_cast_Double(Tensor self, bool non_blocking=False) -> Tensor",
    "_cast_Float(Tensor self, bool non_blocking=False) -> Tensor",
    "_cast_Half(Tensor self, bool non_blocking=False) -> Tensor",
    "_cast_Int(Tensor self, bool non_blocking=False) -> Tensor",
    "_cast_Long(Tensor self, bool non_blocking=False) -> Tensor",
    "_cast_Short(Tensor self, bool non_blocking=False) -> Tensor",
    // tensor properties
    "dtype(Tensor self) -> int",
    "device(Tensor self) -> Device",
    "device(str a) -> Device",
    "shape(Tensor self) -> int[]",
    "is_cuda(Tensor self) -> bool",
    "requires_grad(Tensor self) -> bool",
    // tensor ops
    "size(Tensor self) -> int[]",
    "relu(Tensor self) -> Tensor",
    "sum(Tensor self) -> Tensor",
    "view(Tensor self, int[] size) -> Tensor",
    "zeros(int[] size, *, int dtype=6, Device? device=None) -> Tensor",
    "ones(int[] size, *, int dtype=6, Device? device=None) -> Tensor",
    "cat(Tensor[] tensors, int dim=0) -> Tensor",
    "max_pool2d(Tensor self, int[2] kernel_size, int[2] stride=1, int[2] padding=0, bool ceil_mode=False) -> Tensor",
    "to(Tensor self, Device device) -> Tensor",
    "where(Tensor condition, Tensor self, Tensor other) -> Tensor",
    "min(Tensor self, Tensor? other) -> Tensor",
    // lists
    "len(t[] a) -> int",
    "append(t[] self, t el) -> t[]",
    // strings
    "format(str self, ...) -> str",
    // futures
    "wait(Future(t) self) -> t",
];
