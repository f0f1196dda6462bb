use super::{Address, Signer};

use blake2::{Blake2s256, Digest};

/// Signs with a keyed hash over the message. Stands in for a wallet in
/// tests and simulations; the ledger never verifies it.
#[derive(Clone)]
pub struct KeyedSigner {
    address: Address,
    key: Vec<u8>,
}

impl KeyedSigner {
    /// A signer whose key is derived from its address.
    pub fn new(address: impl Into<String>) -> Self {
        let address = Address::new(address);
        let key = Blake2s256::digest(address.as_str().as_bytes()).to_vec();
        Self { address, key }
    }
}

impl Signer for KeyedSigner {
    fn address(&self) -> &Address {
        &self.address
    }

    fn sign_message(&self, message: &[u8]) -> Vec<u8> {
        Blake2s256::new()
            .chain_update(&self.key)
            .chain_update(message)
            .finalize()
            .to_vec()
    }
}
