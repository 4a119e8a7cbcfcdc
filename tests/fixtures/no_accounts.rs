use anchor_lang::prelude::*;

#[account]
pub struct Counter {
    pub count: u64,
}

pub fn increment(counter: &mut Counter) {
    counter.count += 1;
}
