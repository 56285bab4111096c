/// Wire encoding of an object reference. The callee never hands out `0`;
/// it is reserved as the null handle.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct RefNum(pub i32);

impl RefNum {
    /// The null handle. Written only as the zero value of an ObjectRef result
    /// on the failure path.
    pub const NULL: RefNum = RefNum(0);

    /// First handle assigned to a live object.
    pub const FIRST: RefNum = RefNum(1);

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Default for RefNum {
    fn default() -> Self {
        RefNum::NULL
    }
}

impl std::fmt::Display for RefNum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ref#{}", self.0)
    }
}
