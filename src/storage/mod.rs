// SPDX-License-Identifier: Apache-2.0

pub mod flat_file_storage;
pub mod memory_storage;
pub mod sql_storage;
pub mod traits;
pub mod tree_storage;
