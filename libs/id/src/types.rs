//! Typed identifier definitions for taskwork records.
//!
//! Each type wraps a validated document name. The types are distinct so a
//! worker name can never be passed where a task name is expected.

use crate::define_name;

// =============================================================================
// People
// =============================================================================

define_name!(WorkerId, "worker");

// =============================================================================
// Work Records
// =============================================================================

define_name!(TaskId, "task");
define_name!(RequestId, "task work request");
define_name!(PlanId, "task work plan");
define_name!(AssignmentId, "task work assignment");

// =============================================================================
// Tests
// =============================================================================
