use indicatif::ProgressBar;

/// Creates the progress bar shown while a batch of input files is processed.
/// Hidden for single-file runs so plain output stays clean.
pub fn batch_progress(len: u64) -> ProgressBar {
    if len > 1 {
        ProgressBar::new(len)
    } else {
        ProgressBar::hidden()
    }
}
