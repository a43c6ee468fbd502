use ethers::types::{H160, H256};

pub struct Hashes;

impl Hashes {
    pub fn h160_to_string(h160: &H160) -> String {
        format!("{h160:?}")
    }

    pub fn h256_to_string(h256: &H256) -> String {
        format!("{h256:?}")
    }
}
