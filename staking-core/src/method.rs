// Method tags prefixed to every call payload, one table per chain family.

pub mod account {
    pub const STAKE: [u8; 4] = [0x7a, 0x76, 0x6d, 0x3c];
    pub const UNSTAKE: [u8; 4] = [0x2e, 0x17, 0xde, 0x78];
    pub const REDELEGATE: [u8; 4] = [0x6b, 0xd8, 0x22, 0x1f];
    pub const CLAIM_REWARDS: [u8; 4] = [0xef, 0x5c, 0xfb, 0x8c];
    pub const CLAIM_ALL_REWARDS: [u8; 4] = [0x0b, 0x8a, 0x1b, 0x5e];
    pub const WITHDRAW_REWARDS: [u8; 4] = [0x3d, 0x18, 0xb9, 0x12];
    pub const ENABLE_AUTOCOMPOUND: [u8; 4] = [0x52, 0xa0, 0x6e, 0x27];
    pub const DISABLE_AUTOCOMPOUND: [u8; 4] = [0x9c, 0x41, 0x07, 0xd3];
}

pub mod utxo {
    pub const STAKE: [u8; 4] = [0x01, 0x00, 0x00, 0x01];
    pub const UNSTAKE: [u8; 4] = [0x01, 0x00, 0x00, 0x02];
    pub const REDELEGATE: [u8; 4] = [0x01, 0x00, 0x00, 0x03];
    pub const CLAIM_REWARDS: [u8; 4] = [0x01, 0x00, 0x01, 0x01];
    pub const CLAIM_ALL_REWARDS: [u8; 4] = [0x01, 0x00, 0x01, 0x02];
    pub const WITHDRAW_REWARDS: [u8; 4] = [0x01, 0x00, 0x01, 0x03];
    pub const ENABLE_AUTOCOMPOUND: [u8; 4] = [0x01, 0x00, 0x02, 0x01];
    pub const DISABLE_AUTOCOMPOUND: [u8; 4] = [0x01, 0x00, 0x02, 0x02];
}

pub mod federated {
    pub const STAKE: [u8; 4] = [0xa1, 0x5e, 0x00, 0x10];
    pub const UNSTAKE: [u8; 4] = [0xa1, 0x5e, 0x00, 0x11];
    pub const REDELEGATE: [u8; 4] = [0xa1, 0x5e, 0x00, 0x12];
    pub const CLAIM_REWARDS: [u8; 4] = [0xa1, 0x5e, 0x00, 0x20];
    pub const CLAIM_ALL_REWARDS: [u8; 4] = [0xa1, 0x5e, 0x00, 0x21];
    pub const WITHDRAW_REWARDS: [u8; 4] = [0xa1, 0x5e, 0x00, 0x22];
    pub const ENABLE_AUTOCOMPOUND: [u8; 4] = [0xa1, 0x5e, 0x00, 0x30];
    pub const DISABLE_AUTOCOMPOUND: [u8; 4] = [0xa1, 0x5e, 0x00, 0x31];
}
