//! BN254 BLS operations for the remote signer
//!
//! Signatures live in G1 and verify against a G2 public key:
//! - `sign_message` hashes a 32-byte block to G1 and multiplies by the secret scalar
//! - `sign_hashed_point` multiplies a caller-provided G1 point directly
//! - verification is the pairing check e(sig, G2_gen) == e(H(m), pub_g2)
//!
//! Wire encodings match the service's legacy format: the canonical public-key
//! identifier is the 32-byte compressed G1 form (big-endian x with a two-bit
//! flag in the first byte), while signatures and `SignG1` payloads use the
//! 64-byte uncompressed form, x then y, both big-endian.
//!
//! Signing multiplies through a windowed GLV ladder. Public keys and
//! signatures are validated on parse, but the `SignG1` payload is taken
//! as-is ([`G1Point::deserialize_unchecked`]): off-curve encodings multiply
//! to the ladder's deterministic image, which existing clients observe.

use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::pairing::Pairing;
use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ec::{AffineRepr, CurveGroup, Group};
use ark_ff::{BigInteger, Field, PrimeField};
use num_bigint::{BigInt, BigUint, Sign};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::error::Bn254Error;

/// Compressed G1 encoding length (big-endian x with flag bits).
pub const G1_COMPRESSED_SIZE: usize = 32;

/// Compressed G2 encoding length (x.c1 then x.c0, big-endian, flag bits).
pub const G2_COMPRESSED_SIZE: usize = 64;

/// Uncompressed G1 encoding length (big-endian x then y).
pub const G1_SERIALIZED_SIZE: usize = 64;

// Flag bits in the most significant byte of a compressed encoding.
const FLAG_MASK: u8 = 0b11 << 6;
const FLAG_COMPRESSED_SMALLEST: u8 = 0b10 << 6;
const FLAG_COMPRESSED_LARGEST: u8 = 0b11 << 6;
const FLAG_COMPRESSED_INFINITY: u8 = 0b01 << 6;

/// BN254 secret scalar in F_r (32 bytes big-endian on the wire).
///
/// The scalar is wiped from memory on drop and never printed by `Debug`.
#[derive(Clone)]
pub struct PrivateKey(Fr);

impl Zeroize for PrivateKey {
    fn zeroize(&mut self) {
        // Volatile write so the wipe survives dead-store elimination.
        unsafe { core::ptr::write_volatile(&mut self.0, Fr::from(0u64)) };
        core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl zeroize::ZeroizeOnDrop for PrivateKey {}

impl PrivateKey {
    /// Draw a fresh scalar from a CSPRNG.
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 48];
        rng.fill_bytes(&mut bytes);
        // 384 bits reduced mod r keeps the bias negligible.
        let sk = Fr::from_be_bytes_mod_order(&bytes);
        bytes.zeroize();
        Self(sk)
    }

    /// Parse a 32-byte big-endian scalar, rejecting values outside F_r.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, Bn254Error> {
        if bytes.len() != 32 {
            return Err(Bn254Error::InvalidScalar(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let sk = Fr::from_be_bytes_mod_order(bytes);
        // A reduced value round-trips to the same bytes; anything >= r does not.
        if sk.into_bigint().to_bytes_be() != bytes {
            return Err(Bn254Error::InvalidScalar(
                "scalar out of field range".to_string(),
            ));
        }
        Ok(Self(sk))
    }

    /// Parse a hex scalar (optional `0x` prefix). Values are reduced mod r.
    pub fn from_hex_str(s: &str) -> Result<Self, Bn254Error> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| Bn254Error::InvalidScalar(format!("invalid hex: {e}")))?;
        if bytes.is_empty() {
            return Err(Bn254Error::InvalidScalar("empty scalar".to_string()));
        }
        Ok(Self(Fr::from_be_bytes_mod_order(&bytes)))
    }

    /// Parse a decimal scalar string. Values are reduced mod r.
    pub fn from_decimal_str(s: &str) -> Result<Self, Bn254Error> {
        use core::str::FromStr;
        Fr::from_str(s)
            .map(Self)
            .map_err(|_| Bn254Error::InvalidScalar(format!("invalid decimal scalar: {s:?}")))
    }

    /// Serialize to 32 bytes big-endian.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let bytes = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        out
    }

    pub(crate) fn scalar(&self) -> &Fr {
        &self.0
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("scalar", &"[REDACTED]")
            .finish()
    }
}

/// A point on G1 (public keys and signatures).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct G1Point(G1Affine);

impl G1Point {
    pub fn generator() -> Self {
        Self(G1Affine::generator())
    }

    /// Add another G1 point (used for signature and key aggregation).
    pub fn add(&self, other: &G1Point) -> G1Point {
        Self((G1Projective::from(self.0) + other.0).into_affine())
    }

    /// 64-byte uncompressed encoding: x then y, both big-endian.
    pub fn serialize(&self) -> [u8; G1_SERIALIZED_SIZE] {
        let mut out = [0u8; G1_SERIALIZED_SIZE];
        if self.0.is_zero() {
            return out;
        }
        out[..32].copy_from_slice(&fq_to_be_bytes(&self.0.x));
        out[32..].copy_from_slice(&fq_to_be_bytes(&self.0.y));
        out
    }

    /// Parse the 64-byte uncompressed encoding. The point must be on the
    /// curve; G1 has cofactor 1 so on-curve implies prime-order.
    pub fn deserialize(data: &[u8]) -> Result<Self, Bn254Error> {
        if data.len() != G1_SERIALIZED_SIZE {
            return Err(Bn254Error::InvalidPoint(format!(
                "expected {G1_SERIALIZED_SIZE} bytes, got {}",
                data.len()
            )));
        }
        if data.iter().all(|b| *b == 0) {
            return Ok(Self(G1Affine::zero()));
        }
        let x = fq_from_be_bytes(&data[..32])?;
        let y = fq_from_be_bytes(&data[32..])?;
        let point = G1Affine::new_unchecked(x, y);
        if !point.is_on_curve() {
            return Err(Bn254Error::InvalidPoint("point is not on curve".to_string()));
        }
        Ok(Self(point))
    }

    /// Parse the 64-byte encoding without curve validation. Coordinates are
    /// reduced mod p and the point is taken as-is; (0, 0) decodes to the
    /// identity. Errors only on a wrong length.
    ///
    /// This is the `SignG1` payload parse; public keys and signatures go
    /// through the validated [`G1Point::deserialize`].
    pub fn deserialize_unchecked(data: &[u8]) -> Result<Self, Bn254Error> {
        if data.len() != G1_SERIALIZED_SIZE {
            return Err(Bn254Error::InvalidPoint(format!(
                "expected {G1_SERIALIZED_SIZE} bytes, got {}",
                data.len()
            )));
        }
        let x = Fq::from_be_bytes_mod_order(&data[..32]);
        let y = Fq::from_be_bytes_mod_order(&data[32..]);
        if x == Fq::ZERO && y == Fq::ZERO {
            return Ok(Self(G1Affine::zero()));
        }
        Ok(Self(G1Affine::new_unchecked(x, y)))
    }

    /// 32-byte compressed encoding: big-endian x, flag bits in the first byte.
    pub fn to_compressed(&self) -> [u8; G1_COMPRESSED_SIZE] {
        let mut out = [0u8; G1_COMPRESSED_SIZE];
        if self.0.is_zero() {
            out[0] = FLAG_COMPRESSED_INFINITY;
            return out;
        }
        out.copy_from_slice(&fq_to_be_bytes(&self.0.x));
        out[0] |= if fq_lexicographically_largest(&self.0.y) {
            FLAG_COMPRESSED_LARGEST
        } else {
            FLAG_COMPRESSED_SMALLEST
        };
        out
    }

    /// Lowercase hex of the compressed form: the canonical key identifier.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// Parse the 32-byte compressed encoding.
    pub fn from_compressed(data: &[u8]) -> Result<Self, Bn254Error> {
        if data.len() != G1_COMPRESSED_SIZE {
            return Err(Bn254Error::InvalidPoint(format!(
                "expected {G1_COMPRESSED_SIZE} bytes, got {}",
                data.len()
            )));
        }
        let flags = data[0] & FLAG_MASK;
        if flags == FLAG_COMPRESSED_INFINITY {
            return Ok(Self(G1Affine::zero()));
        }
        if flags != FLAG_COMPRESSED_SMALLEST && flags != FLAG_COMPRESSED_LARGEST {
            return Err(Bn254Error::InvalidPoint("invalid flag bits".to_string()));
        }
        let mut bytes = [0u8; G1_COMPRESSED_SIZE];
        bytes.copy_from_slice(data);
        bytes[0] &= !FLAG_MASK;
        let x = fq_from_be_bytes(&bytes)?;
        let y2 = x * x * x + Fq::from(3u64);
        let mut y = y2
            .sqrt()
            .ok_or_else(|| Bn254Error::InvalidPoint("x is not on curve".to_string()))?;
        if fq_lexicographically_largest(&y) != (flags == FLAG_COMPRESSED_LARGEST) {
            y = -y;
        }
        Ok(Self(G1Affine::new_unchecked(x, y)))
    }

    /// Parse the hex form of the compressed encoding (optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, Bn254Error> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| Bn254Error::InvalidPoint(format!("invalid hex: {e}")))?;
        Self::from_compressed(&bytes)
    }

    pub(crate) fn inner(&self) -> &G1Affine {
        &self.0
    }
}

impl std::fmt::Debug for G1Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "G1Point({})", self.to_hex())
    }
}

/// A point on G2 (the verification public key).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct G2Point(G2Affine);

impl G2Point {
    pub fn generator() -> Self {
        Self(G2Affine::generator())
    }

    /// Add another G2 point (aggregate public key).
    pub fn add(&self, other: &G2Point) -> G2Point {
        Self((G2Projective::from(self.0) + other.0).into_affine())
    }

    /// 64-byte compressed encoding: x.c1 then x.c0, big-endian, flags on the
    /// first byte.
    pub fn to_compressed(&self) -> [u8; G2_COMPRESSED_SIZE] {
        let mut out = [0u8; G2_COMPRESSED_SIZE];
        if self.0.is_zero() {
            out[0] = FLAG_COMPRESSED_INFINITY;
            return out;
        }
        out[..32].copy_from_slice(&fq_to_be_bytes(&self.0.x.c1));
        out[32..].copy_from_slice(&fq_to_be_bytes(&self.0.x.c0));
        out[0] |= if fq2_lexicographically_largest(&self.0.y) {
            FLAG_COMPRESSED_LARGEST
        } else {
            FLAG_COMPRESSED_SMALLEST
        };
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// Parse the 64-byte compressed encoding, including the subgroup check
    /// (G2 has a non-trivial cofactor).
    pub fn from_compressed(data: &[u8]) -> Result<Self, Bn254Error> {
        if data.len() != G2_COMPRESSED_SIZE {
            return Err(Bn254Error::InvalidPoint(format!(
                "expected {G2_COMPRESSED_SIZE} bytes, got {}",
                data.len()
            )));
        }
        let flags = data[0] & FLAG_MASK;
        if flags == FLAG_COMPRESSED_INFINITY {
            return Ok(Self(G2Affine::zero()));
        }
        if flags != FLAG_COMPRESSED_SMALLEST && flags != FLAG_COMPRESSED_LARGEST {
            return Err(Bn254Error::InvalidPoint("invalid flag bits".to_string()));
        }
        let mut c1_bytes = [0u8; 32];
        c1_bytes.copy_from_slice(&data[..32]);
        c1_bytes[0] &= !FLAG_MASK;
        let c1 = fq_from_be_bytes(&c1_bytes)?;
        let c0 = fq_from_be_bytes(&data[32..])?;
        let x = Fq2::new(c0, c1);
        let y2 = x * x * x + ark_bn254::g2::Config::COEFF_B;
        let mut y = y2
            .sqrt()
            .ok_or_else(|| Bn254Error::InvalidPoint("x is not on curve".to_string()))?;
        if fq2_lexicographically_largest(&y) != (flags == FLAG_COMPRESSED_LARGEST) {
            y = -y;
        }
        let point = G2Affine::new_unchecked(x, y);
        if !point.is_in_correct_subgroup_assuming_on_curve() {
            return Err(Bn254Error::InvalidPoint(
                "point is not in the prime-order subgroup".to_string(),
            ));
        }
        Ok(Self(point))
    }

    pub fn from_hex(s: &str) -> Result<Self, Bn254Error> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| Bn254Error::InvalidPoint(format!("invalid hex: {e}")))?;
        Self::from_compressed(&bytes)
    }

    pub(crate) fn inner(&self) -> &G2Affine {
        &self.0
    }
}

impl std::fmt::Debug for G2Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "G2Point({})", self.to_hex())
    }
}

/// A BLS signature: a G1 point, 64 bytes on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature(G1Point);

impl Signature {
    /// Aggregate another signature over the same message.
    pub fn add(&self, other: &Signature) -> Signature {
        Self(self.0.add(&other.0))
    }

    /// Verify against a G2 public key: e(sig, G2_gen) == e(H(msg), pub_g2).
    pub fn verify(&self, pub_g2: &G2Point, msg: &[u8; 32]) -> bool {
        let h = hash_to_curve_g1(msg);
        Bn254::pairing(*self.0.inner(), *G2Point::generator().inner())
            == Bn254::pairing(*h.inner(), *pub_g2.inner())
    }

    pub fn serialize(&self) -> [u8; G1_SERIALIZED_SIZE] {
        self.0.serialize()
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, Bn254Error> {
        G1Point::deserialize(data).map(Self)
    }

    pub fn g1_point(&self) -> &G1Point {
        &self.0
    }
}

/// A BN254 key pair: the secret scalar plus its cached G1 public key.
pub struct KeyPair {
    private_key: PrivateKey,
    pub_g1: G1Point,
}

impl KeyPair {
    pub fn new(private_key: PrivateKey) -> Self {
        let pub_g1 = scalar_to_g1(&private_key);
        Self {
            private_key,
            pub_g1,
        }
    }

    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        Self::new(PrivateKey::generate(rng))
    }

    /// Build from a 32-byte big-endian secret scalar.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, Bn254Error> {
        PrivateKey::from_be_bytes(bytes).map(Self::new)
    }

    /// Build from a decimal scalar string.
    pub fn from_decimal_str(s: &str) -> Result<Self, Bn254Error> {
        PrivateKey::from_decimal_str(s).map(Self::new)
    }

    /// Build from a hex scalar string (optional `0x` prefix).
    pub fn from_hex_str(s: &str) -> Result<Self, Bn254Error> {
        PrivateKey::from_hex_str(s).map(Self::new)
    }

    /// Sign a 32-byte block: sk · H(msg).
    pub fn sign_message(&self, msg: &[u8; 32]) -> Signature {
        let h = hash_to_curve_g1(msg);
        self.sign_hashed_point(&h)
    }

    /// Sign an already-hashed G1 point: sk · P.
    ///
    /// The multiplication runs the windowed GLV ladder and does not require
    /// the point to be on the curve; an off-curve point (reachable only via
    /// [`G1Point::deserialize_unchecked`]) maps to the ladder's
    /// deterministic image.
    pub fn sign_hashed_point(&self, point: &G1Point) -> Signature {
        let sig = mul_glv_unchecked(point.inner(), self.private_key.scalar());
        Signature(G1Point(sig))
    }

    pub fn public_key_g1(&self) -> &G1Point {
        &self.pub_g1
    }

    pub fn public_key_g2(&self) -> G2Point {
        scalar_to_g2(&self.private_key)
    }

    /// Canonical public-key identifier: compressed G1, lowercase hex.
    pub fn pub_key_hex(&self) -> String {
        self.pub_g1.to_hex()
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("pub_g1", &self.pub_g1)
            .finish()
    }
}

/// sk · G1_gen.
pub fn scalar_to_g1(sk: &PrivateKey) -> G1Point {
    G1Point(
        G1Affine::generator()
            .mul_bigint(sk.scalar().into_bigint())
            .into_affine(),
    )
}

/// sk · G2_gen.
pub fn scalar_to_g2(sk: &PrivateKey) -> G2Point {
    G2Point(
        G2Affine::generator()
            .mul_bigint(sk.scalar().into_bigint())
            .into_affine(),
    )
}

/// Map a 32-byte block to G1 by try-and-increment: x starts at the big-endian
/// value of the block mod p and is bumped until x^3 + 3 is a square.
pub fn hash_to_curve_g1(msg: &[u8; 32]) -> G1Point {
    let mut x = Fq::from_be_bytes_mod_order(msg);
    loop {
        let y2 = x * x * x + Fq::from(3u64);
        if let Some(y) = y2.sqrt() {
            return G1Point(G1Affine::new_unchecked(x, y));
        }
        x += Fq::ONE;
    }
}

/// Check the discrete-log equality e(p1, G2_gen) == e(G1_gen, p2), i.e. that
/// a G1 and a G2 public key were derived from the same scalar.
pub fn g1_g2_dl_equality(p1: &G1Point, p2: &G2Point) -> bool {
    Bn254::pairing(*p1.inner(), *G2Point::generator().inner())
        == Bn254::pairing(*G1Point::generator().inner(), *p2.inner())
}

// ---- windowed GLV scalar multiplication ----

// Endomorphism constant β: φ(x, y) = (βx, y) acts as multiplication by λ
// on G1.
const GLV_BETA_BYTES: [u8; 24] = [
    0x59, 0xe2, 0x6b, 0xce, 0xa0, 0xd4, 0x8b, 0xac, 0xd4, 0xf2, 0x63, 0xf1, 0xac, 0xdb, 0x5c,
    0x4f, 0x57, 0x63, 0x47, 0x31, 0x77, 0xff, 0xff, 0xfe,
];

// Short lattice basis (v1, v2) for the decomposition k = k1 + k2·λ (mod r),
// with v11 + v12·λ ≡ v21 + v22·λ ≡ 0 (mod r) and determinant exactly r.
const GLV_V11: u64 = 9931322734385697763;
// v12 is negative; its magnitude is stored.
const GLV_V12_ABS: u128 = 147946756881789319000765030803803410728;
const GLV_V21: u128 = 147946756881789319010696353538189108491;
const GLV_V22: u64 = 9931322734385697763;

fn glv_beta() -> Fq {
    Fq::from_be_bytes_mod_order(&GLV_BETA_BYTES)
}

fn glv_endomorphism(point: &G1Affine) -> G1Affine {
    G1Affine::new_unchecked(glv_beta() * point.x, point.y)
}

/// Decompose a scalar into (|k1|, k1 < 0, |k2|, k2 < 0) with
/// k1 + k2·λ ≡ k (mod r). The basis bounds keep both halves under 128 bits.
fn glv_split(scalar: &Fr) -> (u128, bool, u128, bool) {
    let s = BigInt::from(BigUint::from_bytes_be(
        &scalar.into_bigint().to_bytes_be(),
    ));
    let v11 = BigInt::from(GLV_V11);
    let v12 = -BigInt::from(GLV_V12_ABS);
    let v21 = BigInt::from(GLV_V21);
    let v22 = BigInt::from(GLV_V22);
    let det = &v11 * &v22 - &v12 * &v21;

    // Babai rounding with floor division; both numerators are non-negative.
    let c1 = (&v22 * &s) / &det;
    let c2 = (-&v12 * &s) / &det;

    let k1 = &s - &c1 * &v11 - &c2 * &v21;
    let k2 = -(&c1 * &v12 + &c2 * &v22);

    let (k1_abs, k1_neg) = bigint_magnitude(&k1);
    let (k2_abs, k2_neg) = bigint_magnitude(&k2);
    (k1_abs, k1_neg, k2_abs, k2_neg)
}

fn bigint_magnitude(v: &BigInt) -> (u128, bool) {
    let digits = v.magnitude().to_u64_digits();
    let lo = digits.first().copied().unwrap_or(0) as u128;
    let hi = digits.get(1).copied().unwrap_or(0) as u128;
    ((hi << 64) | lo, v.sign() == Sign::Minus)
}

/// Scalar multiplication via a 2-bit windowed GLV ladder over the split
/// scalar. The input is multiplied as-is: on-curve points yield sk · P,
/// and off-curve encodings yield the ladder's deterministic image.
fn mul_glv_unchecked(point: &G1Affine, scalar: &Fr) -> G1Affine {
    if point.is_zero() {
        return G1Affine::zero();
    }

    let (k1, k1_neg, k2, k2_neg) = glv_split(scalar);

    let mut p1 = G1Projective::from(*point);
    let mut p2 = G1Projective::from(glv_endomorphism(point));
    if k1_neg {
        p1 = -p1;
    }
    if k2_neg {
        p2 = -p2;
    }

    // table[(b2 << 2 | b1) - 1] = b1·P + b2·φ(P)
    let mut table = [G1Projective::from(G1Affine::zero()); 15];
    table[0] = p1;
    table[1] = table[0].double();
    table[2] = table[1] + table[0];
    table[3] = p2;
    table[4] = table[3] + table[0];
    table[5] = table[3] + table[1];
    table[6] = table[3] + table[2];
    table[7] = table[3].double();
    table[8] = table[7] + table[0];
    table[9] = table[7] + table[1];
    table[10] = table[7] + table[2];
    table[11] = table[7] + table[3];
    table[12] = table[11] + table[0];
    table[13] = table[11] + table[1];
    table[14] = table[11] + table[2];

    let bits = (128 - k1.leading_zeros()).max(128 - k2.leading_zeros());
    let digit_count = (bits + 1) / 2;

    let mut acc = G1Projective::from(G1Affine::zero());
    for i in (0..digit_count).rev() {
        acc = acc.double().double();
        let b1 = ((k1 >> (2 * i)) & 3) as usize;
        let b2 = ((k2 >> (2 * i)) & 3) as usize;
        if b1 | b2 != 0 {
            acc += table[((b2 << 2) | b1) - 1];
        }
    }

    acc.into_affine()
}

fn fq_to_be_bytes(v: &Fq) -> [u8; 32] {
    let bytes = v.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    out
}

fn fq_from_be_bytes(bytes: &[u8]) -> Result<Fq, Bn254Error> {
    let v = Fq::from_be_bytes_mod_order(bytes);
    if v.into_bigint().to_bytes_be() != bytes {
        return Err(Bn254Error::InvalidPoint(
            "coordinate out of field range".to_string(),
        ));
    }
    Ok(v)
}

fn fq_lexicographically_largest(y: &Fq) -> bool {
    y.into_bigint() > Fq::MODULUS_MINUS_ONE_DIV_TWO
}

fn fq2_lexicographically_largest(y: &Fq2) -> bool {
    if y.c1 == Fq::ZERO {
        fq_lexicographically_largest(&y.c0)
    } else {
        fq_lexicographically_largest(&y.c1)
    }
}
