// Copyright 2022 Spanfile
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use thiserror::Error;

/// Result type alias for quantization operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a palette.
///
/// Degenerate inputs (no pixels, all-zero weights, no palette capacity left) are not errors; they produce an
/// unextended palette instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("table factor must be at least 2, got {0}")]
    InvalidTableFactor(usize),

    #[error("color table for {area} pixels with factor {factor} does not fit in memory")]
    TableSizeOverflow { area: u64, factor: usize },

    #[error("color table of {capacity} slots has no free slot left")]
    TableFull { capacity: usize },
}
