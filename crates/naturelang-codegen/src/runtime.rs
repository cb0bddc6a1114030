//! Names of the runtime symbols the generated C may reference.
//!
//! The runtime library itself is external; the generator only agrees with it
//! on this interface. Everything else in the emitted translation unit is
//! plain C standard library.

/// Header the generated C includes for the declarations below.
pub const RUNTIME_HEADER: &str = "naturelang_runtime.h";

/// `NLList *nl_list_create(long long capacity, ...)`.
pub const LIST_CREATE: &str = "nl_list_create";

/// `void nl_list_append(NLList *list, long long value)`.
pub const LIST_APPEND: &str = "nl_list_append";

/// `long long nl_list_get_num(NLList *list, long long index)`.
pub const LIST_GET_NUM: &str = "nl_list_get_num";

/// `void nl_list_set(NLList *list, long long index, long long value)`.
pub const LIST_SET: &str = "nl_list_set";

/// `char *nl_concat(const char *left, const char *right)`.
pub const CONCAT: &str = "nl_concat";

/// `char *nl_text_at(const char *text, long long index)` -- the
/// one-character string at the given index.
pub const TEXT_AT: &str = "nl_text_at";

/// `char *nl_num_to_text(long long value)`.
pub const NUM_TO_TEXT: &str = "nl_num_to_text";

/// `char *nl_dec_to_text(double value)`.
pub const DEC_TO_TEXT: &str = "nl_dec_to_text";

/// `long long __list_length(const void *value)` -- length of a list or a
/// text value; also called by the lowering of for-each loops.
pub const LIST_LENGTH: &str = "__list_length";

/// Opaque list type name.
pub const LIST_TYPE: &str = "NLList";

/// File-scope input buffer emitted when `ask`/`read` are used.
pub const INPUT_BUFFER: &str = "nl_input_buffer";

/// Size of the input buffer in bytes.
pub const INPUT_BUFFER_SIZE: usize = 4096;
