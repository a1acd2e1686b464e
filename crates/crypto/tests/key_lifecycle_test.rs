//! Integration tests for the full key lifecycle
//!
//! Exercises generate -> encrypt -> save -> load -> decrypt -> sign, plus
//! the mnemonic recovery path, the way the KMS and signing services chain
//! these primitives together.

use cerberus_crypto::mnemonic::derive_private_key;
use cerberus_crypto::{g1_g2_dl_equality, EncryptedKeystore, KeyPair, Mnemonic};
use secrecy::ExposeSecret;
use tempfile::TempDir;

#[test]
fn test_full_keystore_workflow() {
    // Generate a key pair and capture its identifiers.
    let kp = KeyPair::generate(&mut rand::thread_rng());
    let pub_hex = kp.pub_key_hex();
    let pub_g2 = kp.public_key_g2();
    let sk_bytes = kp.private_key().to_be_bytes();

    // Encrypt and persist.
    let passphrase = "integration-passphrase-12345";
    let keystore = EncryptedKeystore::encrypt(&sk_bytes, passphrase, &pub_hex).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join(format!("{pub_hex}.json"));
    keystore.save(&path).unwrap();

    // Load, decrypt, rebuild the pair.
    let loaded = EncryptedKeystore::load(&path).unwrap();
    assert_eq!(loaded.pubkey(), pub_hex);

    let decrypted = loaded.decrypt(passphrase).unwrap();
    assert_eq!(decrypted.expose_secret().as_slice(), &sk_bytes);

    let restored = KeyPair::from_secret_bytes(decrypted.expose_secret()).unwrap();
    assert_eq!(restored.pub_key_hex(), pub_hex);

    // The restored key still signs and the G1/G2 keys agree.
    let msg = [7u8; 32];
    let sig = restored.sign_message(&msg);
    assert!(sig.verify(&pub_g2, &msg));
    assert!(g1_g2_dl_equality(restored.public_key_g1(), &pub_g2));
}

#[test]
fn test_mnemonic_recovery_reproduces_key() {
    let mnemonic = Mnemonic::generate().unwrap();
    let phrase = mnemonic.phrase().to_string();

    let original = KeyPair::new(derive_private_key(&mnemonic, None).unwrap());

    // Recover from the backup phrase.
    let recovered_mnemonic = Mnemonic::from_phrase(&phrase).unwrap();
    let recovered = KeyPair::new(derive_private_key(&recovered_mnemonic, None).unwrap());

    assert_eq!(original.pub_key_hex(), recovered.pub_key_hex());

    let msg = [9u8; 32];
    let sig = recovered.sign_message(&msg);
    assert!(sig.verify(&original.public_key_g2(), &msg));
}

#[test]
fn test_wrong_passphrase_never_releases_plaintext() {
    let kp = KeyPair::generate(&mut rand::thread_rng());
    let keystore = EncryptedKeystore::encrypt(
        &kp.private_key().to_be_bytes(),
        "right-passphrase",
        &kp.pub_key_hex(),
    )
    .unwrap();

    assert!(keystore.decrypt("wrong-passphrase").is_err());
}

#[test]
fn test_aggregate_signature_of_two_keys() {
    let kp1 = KeyPair::generate(&mut rand::thread_rng());
    let kp2 = KeyPair::generate(&mut rand::thread_rng());
    let msg = [0xAB; 32];

    let agg_sig = kp1.sign_message(&msg).add(&kp2.sign_message(&msg));
    let agg_pub = kp1.public_key_g2().add(&kp2.public_key_g2());

    assert!(agg_sig.verify(&agg_pub, &msg));
    // The aggregate does not verify under either key alone.
    assert!(!agg_sig.verify(&kp1.public_key_g2(), &msg));
}
