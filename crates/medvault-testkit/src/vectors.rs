//! Golden test vectors for deterministic verification.
//!
//! The expected values were computed with an independent PBKDF2 and
//! ChaCha20-Poly1305 implementation. Any port of medvault must reproduce
//! them exactly, or records sealed by one client cannot be opened by
//! another.

use serde::Serialize;

use medvault_core::{Identity, NetworkId};
use medvault_crypto::{decrypt, derive_key, DerivedKey, Envelope, KdfParams, KEY_SIZE};

/// A key derivation vector.
#[derive(Debug, Clone, Serialize)]
pub struct KdfVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Identity as the caller typed it (any case, optional prefix).
    pub identity: &'static str,
    /// Network id.
    pub network: u64,
    /// PBKDF2 iteration count.
    pub iterations: u32,
    /// Expected key (hex).
    pub expected_key: &'static str,
}

/// A record cipher vector with a fixed nonce.
#[derive(Debug, Clone, Serialize)]
pub struct CipherVector {
    pub name: &'static str,
    /// Key (hex).
    pub key: &'static str,
    /// UTF-8 plaintext.
    pub plaintext: &'static str,
    /// Expected wire form, `hex(nonce):hex(body)`.
    pub expected_wire: &'static str,
}

/// Get all key derivation vectors.
pub fn kdf_vectors() -> Vec<KdfVector> {
    vec![
        KdfVector {
            name: "repeated digit identity on network 1",
            identity: "0x1111111111111111111111111111111111111111",
            network: 1,
            iterations: 100_000,
            expected_key: "1edcc22e5ae9cb1ad0b5ed4c1860668e5bbab55a109f761e3f7fe43227d0f6f2",
        },
        KdfVector {
            name: "mixed case identity on a test network",
            identity: "0xABCDEF0123456789abcdef0123456789ABCDEF01",
            network: 11_155_111,
            iterations: 100_000,
            expected_key: "ea2df6dbfeda9ec79e4a15074c1f46d032bbfb8aaf3e38ee6013221bd5afb1c5",
        },
        KdfVector {
            name: "same identity on network 1",
            identity: "abcdef0123456789abcdef0123456789abcdef01",
            network: 1,
            iterations: 100_000,
            expected_key: "3b178c50fad42bceb008ca2a4bf730f0671b7a4253136368a4b89e0f94e7e938",
        },
        KdfVector {
            name: "default iteration count",
            identity: "0x000000000000000000000000000000000000dEaD",
            network: 31_337,
            iterations: 600_000,
            expected_key: "db26b66232cc7e1d509dcaac777da03b6bffb9b275a191ab8f252627d805d1fb",
        },
    ]
}

/// Get all cipher vectors.
pub fn cipher_vectors() -> Vec<CipherVector> {
    vec![
        CipherVector {
            name: "service note",
            key: "1edcc22e5ae9cb1ad0b5ed4c1860668e5bbab55a109f761e3f7fe43227d0f6f2",
            plaintext: "Replaced gradient coil; recalibrated at 1.5T.",
            expected_wire: "000102030405060708090a0b:5a6fc16d06e8d1ac61096ecfb6a3587f704599b4efd38e4cc2638d0155eccd0cde660e8a2e9d3e9e7f7d607519be348e8a5d5c9b5da152214b9a8fc9b3",
        },
        CipherVector {
            name: "empty plaintext is tag only",
            key: "1edcc22e5ae9cb1ad0b5ed4c1860668e5bbab55a109f761e3f7fe43227d0f6f2",
            plaintext: "",
            expected_wire: "000000000000000000000000:b9cead48e144104d9fc64fe43d1ee273",
        },
        CipherVector {
            name: "multi-byte plaintext",
            key: "ea2df6dbfeda9ec79e4a15074c1f46d032bbfb8aaf3e38ee6013221bd5afb1c5",
            plaintext: "Błąd czujnika: 温度 > 40°C",
            expected_wire: "ffffffffffffffffffffffff:fb9aa26bd4135b19170a6f0c212b914c8385bbfec598ad541459e97b0d922e8b43ddcf536bf3908c44cd62a3edc2e2",
        },
    ]
}

fn key_from_hex(hex_key: &str) -> Result<DerivedKey, String> {
    let mut bytes = [0u8; KEY_SIZE];
    hex::decode_to_slice(hex_key, &mut bytes).map_err(|e| format!("bad key hex: {}", e))?;
    Ok(DerivedKey::from_bytes(bytes))
}

/// Check one derivation vector.
pub fn verify_kdf_vector(vector: &KdfVector) -> Result<(), String> {
    let identity = Identity::parse(vector.identity).map_err(|e| e.to_string())?;
    let params = KdfParams::new(vector.iterations).map_err(|e| e.to_string())?;
    let key = derive_key(&identity, NetworkId::new(vector.network), &params);

    if key.to_hex() != vector.expected_key {
        return Err(format!(
            "{}: expected {}, got {}",
            vector.name,
            vector.expected_key,
            key.to_hex()
        ));
    }
    Ok(())
}

/// Check one cipher vector.
///
/// Encryption always draws a fresh nonce, so the vector is checked from the
/// other side: the expected wire must authenticate and decrypt to the
/// plaintext, and must re-encode byte for byte.
pub fn verify_cipher_vector(vector: &CipherVector) -> Result<(), String> {
    let key = key_from_hex(vector.key)?;
    let envelope = Envelope::from_wire(vector.expected_wire).map_err(|e| e.to_string())?;

    if envelope.to_wire() != vector.expected_wire {
        return Err(format!("{}: wire form does not round-trip", vector.name));
    }

    let plaintext = decrypt(&envelope, &key).map_err(|e| format!("{}: {}", vector.name, e))?;
    if plaintext != vector.plaintext {
        return Err(format!(
            "{}: expected {:?}, got {:?}",
            vector.name, vector.plaintext, plaintext
        ));
    }
    Ok(())
}

/// Verify every vector, returning the first mismatch.
pub fn verify_all_vectors() -> Result<(), String> {
    for vector in kdf_vectors() {
        verify_kdf_vector(&vector)?;
    }
    for vector in cipher_vectors() {
        verify_cipher_vector(&vector)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct VectorFile {
    kdf_salt: String,
    kdf: Vec<KdfVector>,
    cipher: Vec<CipherVector>,
}

/// All vectors as pretty JSON, for consumption by other implementations.
pub fn export_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&VectorFile {
        kdf_salt: String::from_utf8_lossy(medvault_crypto::KDF_SALT).into_owned(),
        kdf: kdf_vectors(),
        cipher: cipher_vectors(),
    })
}
