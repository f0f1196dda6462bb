#[cfg(test)]
mod test {
    use crate::commutative::shared_secret::{KeyPair, SharedSecretCipher};
    use crate::commutative::CommutativeCipher;
    use crate::error::CryptoError;
    use crate::utils::rand::{sample_vector, LabeledRng};
    use ark_ec::{AffineRepr, CurveGroup};
    use ark_std::{rand::thread_rng, UniformRand, Zero};

    type Curve = ark_secp256k1::Projective;
    type Scalar = ark_secp256k1::Fr;
    type Cipher = SharedSecretCipher<Curve>;

    fn players(n: usize) -> Vec<KeyPair<Curve>> {
        let mut rng = thread_rng();
        (0..n).map(|_| Cipher::keygen(&mut rng).unwrap()).collect()
    }

    #[test]
    fn round_trip_between_two_players() {
        let mut rng = thread_rng();
        let keys = players(2);
        let (a, b) = (&keys[0], &keys[1]);
        let message = Scalar::rand(&mut rng);

        let ciphertext = Cipher::encrypt(&message, &b.public_key, &a.secret_key).unwrap();
        assert_ne!(ciphertext, message);

        let plaintext = Cipher::decrypt(&ciphertext, &a.public_key, &b.secret_key).unwrap();
        assert_eq!(plaintext, message);
    }

    #[test]
    fn both_sides_derive_the_same_factor() {
        let keys = players(2);
        let ab = Cipher::shared_factor(&keys[1].public_key, &keys[0].secret_key).unwrap();
        let ba = Cipher::shared_factor(&keys[0].public_key, &keys[1].secret_key).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn layers_peel_off_in_either_order_with_matching_keys() {
        let keys = players(3);
        let (a, b, c) = (&keys[0], &keys[1], &keys[2]);
        let message = Scalar::from(7u64);

        // a encrypts towards b, then b encrypts towards c
        let once = Cipher::encrypt(&message, &b.public_key, &a.secret_key).unwrap();
        let twice = Cipher::encrypt(&once, &c.public_key, &b.secret_key).unwrap();

        let peeled = Cipher::decrypt(&twice, &c.public_key, &b.secret_key).unwrap();
        assert_eq!(peeled, once);
        let plain = Cipher::decrypt(&peeled, &b.public_key, &a.secret_key).unwrap();
        assert_eq!(plain, message);

        // layers commute, so peeling a's layer first also works as long as
        // each removal pairs the keys that added it; mismatched pairings are
        // covered by wrong_pairing_yields_garbage_not_an_error
        let other_way = Cipher::decrypt(
            &Cipher::decrypt(&twice, &a.public_key, &b.secret_key).unwrap(),
            &b.public_key,
            &c.secret_key,
        )
        .unwrap();
        assert_eq!(other_way, message);
    }

    #[test]
    fn wrong_pairing_yields_garbage_not_an_error() {
        let keys = players(3);
        let (a, b, c) = (&keys[0], &keys[1], &keys[2]);
        let message = Scalar::from(42u64);

        let ciphertext = Cipher::encrypt(&message, &b.public_key, &a.secret_key).unwrap();

        // c was never part of this layer
        let garbage = Cipher::decrypt(&ciphertext, &a.public_key, &c.secret_key).unwrap();
        assert_ne!(garbage, message);

        // b removing a layer it shares with c instead of a
        let garbage = Cipher::decrypt(&ciphertext, &c.public_key, &b.secret_key).unwrap();
        assert_ne!(garbage, message);
    }

    #[test]
    fn batch_matches_one_by_one() {
        let mut rng = LabeledRng::from_label(b"batch");
        let keys = players(2);
        let messages: Vec<Scalar> = sample_vector(&mut rng, 52);

        let batch = Cipher::encrypt_all(&messages, &keys[1].public_key, &keys[0].secret_key).unwrap();
        let single = messages
            .iter()
            .map(|m| Cipher::encrypt(m, &keys[1].public_key, &keys[0].secret_key).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(batch, single);

        let back = Cipher::decrypt_all(&batch, &keys[0].public_key, &keys[1].secret_key).unwrap();
        assert_eq!(back, messages);
    }

    #[test]
    fn identity_key_is_degenerate() {
        let keys = players(1);
        let identity = Curve::zero().into_affine();
        assert!(identity.xy().is_none());

        assert_eq!(
            Cipher::encrypt(&Scalar::from(1u64), &identity, &keys[0].secret_key),
            Err(CryptoError::DegenerateSharedSecret("point at infinity"))
        );
    }

    #[test]
    fn debug_output_hides_the_secret_key() {
        let keys = players(1);
        let printed = format!("{:?}", keys[0]);
        assert!(printed.contains("public_key"));
        assert!(!printed.contains("secret_key"));
    }
}
