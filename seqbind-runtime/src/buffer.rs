// Buffer: the sequential call buffer shared by caller stubs and dispatchers.
//
// Layout is untagged and unpadded. Values follow each other in the order the
// generated code writes them; the reader already knows the schema from the
// (descriptor, code) it agreed to. All integers are little-endian.
//
//   Bool       1 byte (0 or 1)
//   Int32      4 bytes
//   Int64      8 bytes
//   Float64    8 bytes (IEEE-754 bits)
//   String     Int32 length + UTF-8 bytes
//   Bytes      Int32 length + raw bytes
//   ObjectRef  Int32 RefNum

use seqbind_ffi::RefNum;

use crate::error::{contract_violation, BindError, WireError};

/// Append-only writer with an independent read cursor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
    offset: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Buffer::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Buffer {
            data: Vec::with_capacity(capacity),
            offset: 0,
        }
    }

    /// Wrap received bytes for reading from the start.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Buffer { data, offset: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes not yet consumed by reads.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Move the read cursor back to the start.
    pub fn rewind(&mut self) {
        self.offset = 0;
    }

    // -----------------------------------------------------------------------
    // Writers
    // -----------------------------------------------------------------------

    pub fn write_bool(&mut self, v: bool) {
        self.data.push(u8::from(v));
    }

    pub fn write_i32(&mut self, v: i32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f64(&mut self, v: f64) {
        self.data.extend_from_slice(&v.to_bits().to_le_bytes());
    }

    pub fn write_string(&mut self, v: &str) {
        self.write_bytes(v.as_bytes());
    }

    pub fn write_bytes(&mut self, v: &[u8]) {
        let Ok(len) = i32::try_from(v.len()) else {
            panic!("seqbind: {} byte payload exceeds the i32 length prefix", v.len());
        };
        self.write_i32(len);
        self.data.extend_from_slice(v);
    }

    pub fn write_ref(&mut self, v: RefNum) {
        self.write_i32(v.0);
    }

    // -----------------------------------------------------------------------
    // Fallible readers
    // -----------------------------------------------------------------------

    fn take(&mut self, needed: usize) -> Result<&[u8], WireError> {
        let available = self.remaining();
        if needed > available {
            return Err(WireError::Underflow {
                offset: self.offset,
                needed,
                available,
            });
        }
        let start = self.offset;
        self.offset += needed;
        Ok(&self.data[start..start + needed])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn try_read_bool(&mut self) -> Result<bool, WireError> {
        match self.take_array::<1>()?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::InvalidBool(other)),
        }
    }

    pub fn try_read_i32(&mut self) -> Result<i32, WireError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn try_read_i64(&mut self) -> Result<i64, WireError> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub fn try_read_f64(&mut self) -> Result<f64, WireError> {
        Ok(f64::from_bits(u64::from_le_bytes(self.take_array()?)))
    }

    pub fn try_read_bytes(&mut self) -> Result<Vec<u8>, WireError> {
        let start = self.offset;
        let len = self.try_read_i32()?;
        let Ok(len) = usize::try_from(len) else {
            self.offset = start;
            return Err(WireError::NegativeLength(len));
        };
        let available = self.remaining();
        if len > available {
            let err = WireError::Underflow {
                offset: self.offset,
                needed: len,
                available,
            };
            self.offset = start;
            return Err(err);
        }
        Ok(self.take(len)?.to_vec())
    }

    pub fn try_read_string(&mut self) -> Result<String, WireError> {
        let start = self.offset;
        let bytes = self.try_read_bytes()?;
        String::from_utf8(bytes).map_err(|_| {
            self.offset = start;
            WireError::InvalidUtf8
        })
    }

    pub fn try_read_ref(&mut self) -> Result<RefNum, WireError> {
        self.try_read_i32().map(RefNum)
    }

    // -----------------------------------------------------------------------
    // Readers used by generated code. Both halves were generated from the same
    // model, so a decode failure means the contract is broken.
    // -----------------------------------------------------------------------

    #[track_caller]
    pub fn read_bool(&mut self) -> bool {
        self.try_read_bool().unwrap_or_else(|e| contract_violation(BindError::Wire(e)))
    }

    #[track_caller]
    pub fn read_i32(&mut self) -> i32 {
        self.try_read_i32().unwrap_or_else(|e| contract_violation(BindError::Wire(e)))
    }

    #[track_caller]
    pub fn read_i64(&mut self) -> i64 {
        self.try_read_i64().unwrap_or_else(|e| contract_violation(BindError::Wire(e)))
    }

    #[track_caller]
    pub fn read_f64(&mut self) -> f64 {
        self.try_read_f64().unwrap_or_else(|e| contract_violation(BindError::Wire(e)))
    }

    #[track_caller]
    pub fn read_string(&mut self) -> String {
        self.try_read_string().unwrap_or_else(|e| contract_violation(BindError::Wire(e)))
    }

    #[track_caller]
    pub fn read_bytes(&mut self) -> Vec<u8> {
        self.try_read_bytes().unwrap_or_else(|e| contract_violation(BindError::Wire(e)))
    }

    #[track_caller]
    pub fn read_ref(&mut self) -> RefNum {
        self.try_read_ref().unwrap_or_else(|e| contract_violation(BindError::Wire(e)))
    }
}
