//! Ethereum keypair derivation.

use secp256k1::{PublicKey, Secp256k1, SecretKey, Signing};

use super::{Address, KeyError, ADDRESS_MARKER};

/// An Ethereum keypair: private key, public key and derived address.
#[derive(Debug, Clone)]
pub struct Keypair {
    /// The private key bytes (32 bytes)
    secret_key: [u8; 32],
    /// The uncompressed public key
    public_key: PublicKey,
    /// The derived Ethereum address
    address: Address,
}

impl Keypair {
    /// Derives a keypair from raw secret key bytes.
    ///
    /// Fails if the bytes are zero or not below the curve order.
    pub fn from_secret_key<C: Signing>(
        secp: &Secp256k1<C>,
        secret_bytes: [u8; 32],
    ) -> Result<Self, KeyError> {
        let secret_key = SecretKey::from_slice(&secret_bytes)?;
        let public_key = PublicKey::from_secret_key(secp, &secret_key);
        let address = Address::from_public_key(&public_key);

        Ok(Self {
            secret_key: secret_bytes,
            public_key,
            address,
        })
    }

    /// Returns the private key as 0x-prefixed hex.
    pub fn private_key_hex(&self) -> String {
        format!("{}{}", ADDRESS_MARKER, hex::encode(self.secret_key))
    }

    /// Returns the uncompressed SEC1 public key (65 bytes) as 0x-prefixed hex.
    pub fn public_key_hex(&self) -> String {
        format!(
            "{}{}",
            ADDRESS_MARKER,
            hex::encode(self.public_key.serialize_uncompressed())
        )
    }

    /// Returns the private key bytes.
    pub fn private_key_bytes(&self) -> &[u8; 32] {
        &self.secret_key
    }

    /// Returns a reference to the derived address.
    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(last: u8) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[31] = last;
        bytes
    }

    #[test]
    fn test_known_address_for_key_one() {
        let secp = Secp256k1::signing_only();
        let keypair = Keypair::from_secret_key(&secp, scalar(1)).unwrap();

        assert_eq!(
            keypair.address().to_hex(),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
        // Generator point G
        assert_eq!(
            keypair.public_key_hex(),
            "0x0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
             483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
        );
        assert_eq!(keypair.private_key_hex().len(), 66);
    }

    #[test]
    fn test_zero_key_is_rejected() {
        let secp = Secp256k1::signing_only();
        assert!(Keypair::from_secret_key(&secp, [0u8; 32]).is_err());
    }

    #[test]
    fn test_key_at_curve_order_is_rejected() {
        let secp = Secp256k1::signing_only();
        let order = secp256k1::constants::CURVE_ORDER;
        assert!(Keypair::from_secret_key(&secp, order).is_err());
    }

    #[test]
    fn test_address_from_public_key_matches_private_derivation() {
        let secp = Secp256k1::signing_only();
        let keypair = Keypair::from_secret_key(&secp, scalar(0x2a)).unwrap();

        let from_public = Address::from_public_key_hex(&keypair.public_key_hex()).unwrap();
        assert_eq!(&from_public, keypair.address());
    }
}
