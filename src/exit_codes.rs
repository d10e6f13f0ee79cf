//! Exit code constants for the tagsmith CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, missing project, I/O)
//! - 2: Tag validation failure (malformed tag or argument list)
//! - 3: Resolution failure (file not found or ambiguous)
//! - 4: Integrity failure (checksum mismatch)
//! - 5: Conflicting directives
//! - 6: Subprocess failure (spawn error or timeout)
//! - 7: Remote dispatch failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, uninitialized project, or filesystem failure.
pub const USER_ERROR: i32 = 1;

/// A macro tag or its argument list failed validation.
pub const VALIDATION_FAILURE: i32 = 2;

/// A tag argument could not be resolved to a unique path.
pub const RESOLUTION_FAILURE: i32 = 3;

/// The declared checksum did not match the stripped line delta.
pub const INTEGRITY_FAILURE: i32 = 4;

/// Mutually exclusive directives were given together.
pub const CONFLICT_FAILURE: i32 = 5;

/// A subprocess resolver could not be spawned or timed out.
pub const SUBPROCESS_FAILURE: i32 = 6;

/// The remote model call failed.
pub const DISPATCH_FAILURE: i32 = 7;
