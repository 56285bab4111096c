// C ABI entry points for a caller living outside the Rust process image
// (another language runtime, a wasm host, a plugin loader).
//
// The foreign side owns its input bytes; output bytes are allocated here and
// must be handed back through `seqbind_buffer_free`.

use std::ptr;
use std::slice;

use seqbind_ffi::{RefNum, SeqStatus};

use crate::buffer::Buffer;
use crate::dispatch;
use crate::ffi_guard::fatal_boundary;
use crate::ref_table::refs;

/// Dispatch one call.
///
/// On `SeqStatus::Ok`, `*out_ptr`/`*out_len` describe the response buffer,
/// which the caller must free with [`seqbind_buffer_free`]. An unknown call
/// site or any other contract violation aborts the process.
///
/// # Safety
/// `descriptor` must point to `descriptor_len` readable bytes, `input` to
/// `input_len` readable bytes (it may be null when `input_len` is 0), and
/// `out_ptr`/`out_len` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seqbind_dispatch(
    descriptor: *const u8,
    descriptor_len: usize,
    code: i32,
    input: *const u8,
    input_len: usize,
    out_ptr: *mut *mut u8,
    out_len: *mut usize,
) -> SeqStatus {
    if descriptor.is_null() || out_ptr.is_null() || out_len.is_null() {
        return SeqStatus::NullArgument;
    }
    if input.is_null() && input_len != 0 {
        return SeqStatus::NullArgument;
    }

    // SAFETY: non-null and sized per the caller contract above.
    let descriptor = unsafe { slice::from_raw_parts(descriptor, descriptor_len) };
    let Ok(descriptor) = std::str::from_utf8(descriptor) else {
        return SeqStatus::InvalidDescriptor;
    };
    let input = if input_len == 0 {
        Vec::new()
    } else {
        // SAFETY: non-null and sized per the caller contract above.
        unsafe { slice::from_raw_parts(input, input_len) }.to_vec()
    };

    let response = fatal_boundary("seqbind_dispatch", || {
        let mut input = Buffer::from_bytes(input);
        let mut output = Buffer::new();
        dispatch::dispatch(descriptor, code, &mut output, &mut input);
        output.into_bytes().into_boxed_slice()
    });

    let len = response.len();
    let data = Box::into_raw(response).cast::<u8>();
    // SAFETY: both out pointers were checked non-null.
    unsafe {
        *out_ptr = data;
        *out_len = len;
    }
    SeqStatus::Ok
}

/// Free a response buffer returned by [`seqbind_dispatch`].
///
/// # Safety
/// `data`/`len` must be exactly a pair produced by `seqbind_dispatch`, freed
/// at most once. A null `data` is ignored.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seqbind_buffer_free(data: *mut u8, len: usize) {
    if data.is_null() {
        return;
    }
    // SAFETY: produced by Box::into_raw of a boxed slice of this length.
    drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(data, len)) });
}

/// Release `crossings` caller observations of a callee object.
#[unsafe(no_mangle)]
pub extern "C" fn seqbind_release_ref(num: i32, crossings: u32) {
    fatal_boundary("seqbind_release_ref", || {
        refs().release(RefNum(num), crossings);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ref_table::share;

    fn concat(out: &mut Buffer, input: &mut Buffer) {
        let a = input.read_string();
        let b = input.read_string();
        out.write_string(&(a + &b));
    }

    fn call(descriptor: &[u8], code: i32, input: &[u8]) -> (SeqStatus, Vec<u8>) {
        let mut data = ptr::null_mut();
        let mut len = 0usize;
        let status = unsafe {
            seqbind_dispatch(
                descriptor.as_ptr(),
                descriptor.len(),
                code,
                input.as_ptr(),
                input.len(),
                &mut data,
                &mut len,
            )
        };
        if status != SeqStatus::Ok {
            return (status, Vec::new());
        }
        let bytes = unsafe { slice::from_raw_parts(data, len) }.to_vec();
        unsafe { seqbind_buffer_free(data, len) };
        (status, bytes)
    }

    #[test]
    fn dispatch_through_c_abi() {
        dispatch::register("ffi_tests", 1, concat);
        let mut input = Buffer::new();
        input.write_string("se");
        input.write_string("q");
        let (status, bytes) = call(b"ffi_tests", 1, input.as_bytes());
        assert_eq!(status, SeqStatus::Ok);
        assert_eq!(Buffer::from_bytes(bytes).read_string(), "seq");
    }

    #[test]
    fn null_arguments_are_rejected() {
        let status = unsafe {
            seqbind_dispatch(
                ptr::null(),
                0,
                1,
                ptr::null(),
                0,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        assert_eq!(status, SeqStatus::NullArgument);
    }

    #[test]
    fn non_utf8_descriptor_is_rejected() {
        let (status, _) = call(&[0xff, 0xfe], 1, &[]);
        assert_eq!(status, SeqStatus::InvalidDescriptor);
    }

    #[test]
    fn freeing_null_is_a_no_op() {
        unsafe { seqbind_buffer_free(ptr::null_mut(), 0) };
    }

    #[test]
    fn release_ref_drops_table_entry() {
        let num = refs().insert(share(0u64));
        seqbind_release_ref(num.0, 1);
        assert!(!refs().contains(num));
    }
}
