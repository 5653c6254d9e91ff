//! Generate STM32 Makefiles from a structured build description and read
//! CubeMX-style Makefiles back into one.
//!
//! Everything here works on in-memory text; callers own all file access.

mod extract;
mod format;
mod generate;
mod model;
mod target;

pub use crate::extract::{
    extract_libraries, extract_makefile_info, extract_makefile_info_with, extract_multi_line,
    extract_single_line,
};
pub use crate::format::{
    CONTINUATION, format_list, format_single_line, prefix_if_missing, strip_prefix,
};
pub use crate::generate::{ENVIRONMENT_FILE_NAME, generate_makefile, render_custom_rules};
pub use crate::model::{
    BuildFiles, CustomMakefileRule, DEFAULT_OPTIMIZATION, ExtractedMakefileInfo, MakeInfo, Tools,
    include_directories,
};
pub use crate::target::{FamilyRule, TargetFamilyTable, infer_target_family};
