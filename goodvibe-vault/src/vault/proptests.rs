//! Property-based tests for the vault codec.
//!
//! Each case runs two PBKDF2 derivations, so case counts are kept small.

use proptest::prelude::*;

use super::{decrypt_data, encrypt_data, EncryptedEnvelope};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Decrypting with the same PIN returns the original text.
    #[test]
    fn encrypt_decrypt_roundtrip(plaintext in "\\PC{1,200}", pin in "\\PC{1,16}") {
        let envelope = encrypt_data(&plaintext, &pin).unwrap();
        prop_assert_eq!(decrypt_data(&envelope, &pin).unwrap(), plaintext);
    }

    /// Any other PIN is rejected and yields no plaintext.
    #[test]
    fn wrong_pin_fails(plaintext in "\\PC{1,64}", pin in "[0-9]{6,10}", other in "[0-9]{6,10}") {
        prop_assume!(pin != other);
        let envelope = encrypt_data(&plaintext, &pin).unwrap();
        let err = decrypt_data(&envelope, &other).unwrap_err();
        prop_assert!(err.is_decryption_failure());
    }

    /// Flipping any single bit of the ciphertext breaks authentication.
    #[test]
    fn single_bit_flip_detected(plaintext in "\\PC{1,64}", index in any::<prop::sample::Index>(), bit in 0u8..8) {
        let pin = "123456";
        let mut envelope = EncryptedEnvelope::decode(&encrypt_data(&plaintext, pin).unwrap()).unwrap();
        let i = index.index(envelope.ciphertext.len());
        envelope.ciphertext[i] ^= 1 << bit;

        let result = decrypt_data(&envelope.encode().unwrap(), pin);
        prop_assert!(result.is_err());
    }

    /// Arbitrary strings never decrypt and never panic.
    #[test]
    fn garbage_input_is_rejected(input in "\\PC{0,300}") {
        prop_assert!(decrypt_data(&input, "123456").is_err());
    }
}
