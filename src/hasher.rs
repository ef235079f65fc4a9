//! Pluggable digest algorithms for hashing keys and combining child hashes.
//!
//! Digests travel as lowercase hex strings. Combining two digests hashes the
//! concatenation of their hex encodings, not of the raw digest bytes, so two
//! implementations agree on root hashes as long as they agree on the hex
//! wire form.

use std::fmt::{self, Display};
use std::str::FromStr;

use md5::Md5;
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::TreeError;

/// A lowercase hex digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    pub(crate) fn from_raw(bytes: impl AsRef<[u8]>) -> Self {
        Self(hex::encode(bytes))
    }

    /// Returns the hex text of the digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the bytes of the hex text. This is what gets fed back into the
    /// hasher when two digests are combined.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Digest {
    fn from(hex: String) -> Self {
        Self(hex)
    }
}

impl From<&str> for Digest {
    fn from(hex: &str) -> Self {
        Self(hex.to_owned())
    }
}

/// Digest function used to hash the nodes in the tree.
///
/// Implementations must be pure: the same input always produces the same
/// digest. Trees hold their hasher behind a shared pointer, so the trait is
/// object safe.
pub trait Hasher: Send + Sync {
    /// Hashes `data` and returns its lowercase hex digest.
    fn hash(&self, data: &[u8]) -> Digest;

    /// Digest of two digests, folding over their hex encodings.
    fn concat_hash(&self, left: &Digest, right: &Digest) -> Digest {
        let mut data = Vec::with_capacity(left.as_bytes().len() + right.as_bytes().len());
        data.extend_from_slice(left.as_bytes());
        data.extend_from_slice(right.as_bytes());
        self.hash(&data)
    }
}

fn hex_digest<D: sha2::digest::Digest>(data: &[u8]) -> Digest {
    Digest::from_raw(D::digest(data))
}

/// The built-in digest algorithms.
///
/// `Sha` is SHA-1, kept under its historical selector name. `Sha256OfSha256`
/// applies SHA-256 twice, with the inner digest fed to the outer pass as raw
/// bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    Md5,
    Ripemd160,
    Sha,
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
    Sha256OfSha256,
}

impl HashAlgorithm {
    /// The selector name of the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Ripemd160 => "ripemd160",
            Self::Sha => "sha",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Sha256OfSha256 => "sha256_of_sha256",
        }
    }
}

impl Hasher for HashAlgorithm {
    fn hash(&self, data: &[u8]) -> Digest {
        match self {
            Self::Md5 => hex_digest::<Md5>(data),
            Self::Ripemd160 => hex_digest::<Ripemd160>(data),
            Self::Sha => hex_digest::<Sha1>(data),
            Self::Sha224 => hex_digest::<Sha224>(data),
            Self::Sha256 => hex_digest::<Sha256>(data),
            Self::Sha384 => hex_digest::<Sha384>(data),
            Self::Sha512 => hex_digest::<Sha512>(data),
            Self::Sha256OfSha256 => {
                use sha2::Digest as _;
                let inner = Sha256::digest(data);
                Digest::from_raw(&Sha256::digest(inner))
            }
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "md5" => Ok(Self::Md5),
            "ripemd160" => Ok(Self::Ripemd160),
            "sha" => Ok(Self::Sha),
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            "sha256_of_sha256" => Ok(Self::Sha256OfSha256),
            other => Err(TreeError::InvalidHashFunction(format!(
                "unknown hash algorithm `{other}`"
            ))),
        }
    }
}

/// Hasher backed by a user-supplied function returning a hex digest string.
pub struct FnHasher {
    f: Box<dyn Fn(&[u8]) -> String + Send + Sync>,
}

impl std::fmt::Debug for FnHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHasher").finish_non_exhaustive()
    }
}

impl FnHasher {
    /// Wraps `f`, probing it once to check that it produces a hex digest.
    pub fn new(f: impl Fn(&[u8]) -> String + Send + Sync + 'static) -> Result<Self, TreeError> {
        let probe = f(b"probe");
        let hex_ok = !probe.is_empty()
            && probe.len() % 2 == 0
            && probe
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !hex_ok {
            return Err(TreeError::InvalidHashFunction(probe));
        }
        Ok(Self { f: Box::new(f) })
    }
}

impl Hasher for FnHasher {
    fn hash(&self, data: &[u8]) -> Digest {
        Digest((self.f)(data))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sha256_digest() {
        assert_eq!(
            HashAlgorithm::Sha256.hash(b"starfish").as_str(),
            "3755b417b0f937026ac1b867a397d6dec80dfd463c232c2daaf1de974b93da82"
        );
    }

    #[test]
    fn test_concat_hash_folds_hex_text() {
        let hasher = HashAlgorithm::Sha256;
        let left = hasher.hash(b"centipede");
        let right = hasher.hash(b"starfish");
        let combined = hasher.concat_hash(&left, &right);
        let by_hand = hasher.hash(format!("{left}{right}").as_bytes());
        assert_eq!(combined, by_hand);
        assert_eq!(
            combined.as_str(),
            "649ce009389ef7ab203c4abc8df01b15d10983c2cb4197f71b901a448d21a6e4"
        );
    }

    #[test]
    fn test_algorithm_names_round_trip() {
        let all = [
            HashAlgorithm::Md5,
            HashAlgorithm::Ripemd160,
            HashAlgorithm::Sha,
            HashAlgorithm::Sha224,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
            HashAlgorithm::Sha256OfSha256,
        ];
        for algorithm in all {
            assert_eq!(algorithm.name().parse::<HashAlgorithm>(), Ok(algorithm));
        }
        assert!(matches!(
            "keccak".parse::<HashAlgorithm>(),
            Err(TreeError::InvalidHashFunction(_))
        ));
    }

    #[test]
    fn test_fn_hasher_accepts_hex_output() {
        let hasher = FnHasher::new(|data| HashAlgorithm::Sha256.hash(data).as_str().to_owned())
            .expect("sha256 wrapper is a valid hash function");
        assert_eq!(
            hasher.hash(b"starfish"),
            HashAlgorithm::Sha256.hash(b"starfish")
        );
    }

    #[test]
    fn test_fn_hasher_rejects_non_hex_output() {
        let err = FnHasher::new(|_| "NOT-A-DIGEST".to_owned()).unwrap_err();
        assert_eq!(err, TreeError::InvalidHashFunction("NOT-A-DIGEST".into()));
        assert!(FnHasher::new(|_| String::new()).is_err());
    }
}
