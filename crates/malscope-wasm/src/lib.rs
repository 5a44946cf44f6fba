//! malscope WASM bridge
//!
//! Exposes malscope-core functions through a WASM-compatible ABI for hosts
//! that load the module directly (wazero, wasmtime). No WASI imports needed;
//! every function is pure computation with shared memory string passing.
//!
//! With the `browser` feature the same operations are also exported through
//! wasm-bindgen (see [`browser`]).
//!
//! # Memory Protocol
//!
//! Strings cross the WASM boundary as (ptr, len) pairs in linear memory.
//! The host allocates via [`wasm_alloc`], writes bytes, calls the function,
//! reads the result, then frees via [`wasm_free`].
//!
//! Return values pack pointer and length into a single u64:
//! `(ptr << 32) | len`

#[cfg(feature = "browser")]
pub mod browser;

// ============================================================================
// Memory management
// ============================================================================

/// Allocate `size` bytes in WASM linear memory. Returns a pointer.
/// The host must call `wasm_free` to release.
#[no_mangle]
pub extern "C" fn wasm_alloc(size: u32) -> u32 {
    let layout = match std::alloc::Layout::from_size_align(size as usize, 1) {
        Ok(l) => l,
        Err(_) => return 0,
    };
    if layout.size() == 0 {
        return 0;
    }
    let ptr = unsafe { std::alloc::alloc(layout) };
    if ptr.is_null() {
        return 0;
    }
    ptr as u32
}

/// Free a buffer previously allocated by `wasm_alloc` or returned by an
/// export function.
#[no_mangle]
pub extern "C" fn wasm_free(ptr: u32, size: u32) {
    if ptr == 0 || size == 0 {
        return;
    }
    let layout = match std::alloc::Layout::from_size_align(size as usize, 1) {
        Ok(l) => l,
        Err(_) => return,
    };
    unsafe {
        std::alloc::dealloc(ptr as *mut u8, layout);
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Read a UTF-8 string from WASM linear memory at (ptr, len).
///
/// Invalid UTF-8 is reported instead of trusted, since SOM exports come
/// from arbitrary notebooks.
unsafe fn read_str(ptr: u32, len: u32) -> Result<&'static str, std::str::Utf8Error> {
    if ptr == 0 || len == 0 {
        return Ok("");
    }
    let slice = std::slice::from_raw_parts(ptr as *const u8, len as usize);
    std::str::from_utf8(slice)
}

/// Write a string into newly allocated WASM memory and return packed u64.
/// The caller (host) is responsible for freeing via `wasm_free`.
fn write_result(s: &str) -> u64 {
    let bytes = s.as_bytes();
    let len = bytes.len() as u32;
    let ptr = wasm_alloc(len);
    if ptr == 0 {
        return 0;
    }
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr as *mut u8, len as usize);
    }
    ((ptr as u64) << 32) | (len as u64)
}

/// Write an error JSON response.
fn write_error(msg: &str) -> u64 {
    let json = format!(r#"{{"error":"{}"}}"#, msg.replace('"', "\\\""));
    write_result(&json)
}

/// Run a JSON-in/JSON-out core function over a (ptr, len) input.
fn call_json(ptr: u32, len: u32, f: fn(&str) -> String) -> u64 {
    match unsafe { read_str(ptr, len) } {
        Ok(input) => write_result(&f(input)),
        Err(e) => write_error(&format!("input is not UTF-8: {}", e)),
    }
}

// ============================================================================
// Version info
// ============================================================================

/// Get the malscope-core version. Returns a packed u64 (ptr << 32 | len)
/// pointing to a string containing the version (e.g., "0.1.0").
#[no_mangle]
pub extern "C" fn malscope_core_version() -> u64 {
    write_result(env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// SOM normalization
// ============================================================================

/// Normalize a raw SOM document of any supported shape.
///
/// On success: `{"cells":[{"row":0.0,"col":0.0,"proportions":{..},"counts":{}}],"total":1}`
/// On error: `{"error":"invalid SOM document: ..."}`
#[no_mangle]
pub extern "C" fn normalize_som_document(ptr: u32, len: u32) -> u64 {
    call_json(ptr, len, malscope_core::normalize_som_json)
}

// ============================================================================
// Classification
// ============================================================================

/// Predict a label for a query point.
///
/// Input: `{"query":{"x":..,"y":..},"mode":"grid"|"points","cells"|"points":[..],"k":..}`
/// Returns: `{"label":"..","scores":{..}}` (grid) or `{"label":"..","votes":{..}}` (points)
#[no_mangle]
pub extern "C" fn classify(ptr: u32, len: u32) -> u64 {
    call_json(ptr, len, malscope_core::classify_json)
}

// ============================================================================
// Labels and report
// ============================================================================

/// Assign palette colors to a label catalog.
/// Returns: `{"colors":{"LABEL":"#rrggbb",..},"total":N}`
#[no_mangle]
pub extern "C" fn label_colors(ptr: u32, len: u32) -> u64 {
    call_json(ptr, len, malscope_core::label_colors_json)
}

/// Build a full report from raw documents and a seed.
///
/// Input: `{"filename":"..","labels":..,"points":..,"soms":[..],"families":[..],"apt30_probability":..,"seed":N}`
#[no_mangle]
pub extern "C" fn build_report(ptr: u32, len: u32) -> u64 {
    call_json(ptr, len, malscope_core::build_report_json)
}
