use anchor_lang::prelude::*;

pub const ADMIN: Pubkey = pubkey!("9hSR6S7WPtxmTojgo6GEKZ7XwA5ePDyY1CUpZ3d8R4Zb");

#[derive(Accounts)]
pub struct Deposit<'info> {
    #[account(mut)]
    pub user: Signer<'info>,
    #[account(mut, seeds = [b"vault", user.key().as_ref()], bump)]
    pub vault: SystemAccount<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct SetFee<'info> {
    #[account(address = ADMIN)]
    pub admin: Signer<'info>,
    #[account(
        mut,
        seeds = [b"config"],
        bump = config.bump,
        constraint = !config.paused @ VaultError::Paused
    )]
    pub config: Account<'info, Config>,
    /// CHECK: only receives lamports
    #[account(mut)]
    pub fee_receiver: UncheckedAccount<'info>,
}

#[account]
pub struct Config {
    pub fee_bps: u16,
    pub paused: bool,
    pub bump: u8,
}

#[error_code]
pub enum VaultError {
    #[msg("Vault is paused")]
    Paused,
}
