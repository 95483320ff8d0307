//! Pure scoring functions.
//!
//! Every function here maps a model response (and the item's ground truth)
//! to a score in `[0.0, 1.0]` without side effects.

mod choice;
mod exact;
mod f1;
pub mod instructions;

pub use choice::{OPTION_LABELS, extract_option_letter, score_choice};
pub use exact::{exact_match, normalize};
pub use f1::{best_f1, compute_f1, normalize_answer};
pub use instructions::{Instruction, all_satisfied, check_instruction, instruction_verdicts};
