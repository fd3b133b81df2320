//! End-to-end tests covering the trainer → artifact → server pipeline.

#[cfg(test)]
mod end_to_end;
