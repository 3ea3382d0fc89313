//! Authenticated AES-256-CBC stream: PBKDF2-derived key, the "unaligned
//! count" padding scheme encoded in the salt byte, and a trailing
//! HMAC-SHA256 over the plaintext.

use aes::Aes256;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};
use crate::stream::file::{FileReadStream, FileWriteStream};
use crate::stream::{ReadStream, WriteStream};

type Encryptor = cbc::Encryptor<Aes256>;
type Decryptor = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

const BLOCK: usize = 16;
const SALT_LEN: usize = 32;
const HMAC_LEN: usize = 32;
const IV_LEN: usize = 16;
const PBKDF2_ROUNDS: u32 = 50_000;
const UNCONSUMED_CAP: usize = 64 * 1024;

/// Derives the cipher/HMAC key from the password and KDF salt. Returned
/// wrapped in `Zeroizing` so the raw key bytes are wiped the moment the
/// last clone (the cipher and HMAC construction below) is done with them,
/// rather than lingering in a stack frame until the function returns.
fn derive_key(password: &[u8], kdf_salt: &[u8; SALT_LEN]) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password, kdf_salt, PBKDF2_ROUNDS, &mut *key);
    key
}

/// `salt[0]` masked to the low nibble: the part of the salt that carries
/// real entropy and feeds PBKDF2. The high nibble is reserved for the
/// unaligned count and must never reach the KDF.
fn kdf_salt_of(salt: &[u8; SALT_LEN]) -> [u8; SALT_LEN] {
    let mut s = *salt;
    s[0] &= 0x0f;
    s
}

pub struct CryptoWriteStream<W> {
    inner: W,
    cipher: Encryptor,
    hmac: HmacSha256,
    salt: [u8; SALT_LEN],
    unconsumed: Vec<u8>,
    flushed: bool,
}

impl<W: WriteStream + RewindableWrite> CryptoWriteStream<W> {
    pub fn new(mut inner: W, password: &[u8]) -> Result<Self> {
        // Placeholder for salt||hmac, then the IV, per the header layout.
        inner.write_all(&[0u8; SALT_LEN + HMAC_LEN])?;

        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        rand::thread_rng().fill_bytes(&mut iv);

        inner.write_all(&iv)?;

        let key = derive_key(password, &kdf_salt_of(&salt));
        let cipher = Encryptor::new_from_slices(&*key, &iv).map_err(|e| Error::Crypto(e.to_string()))?;
        let hmac = HmacSha256::new_from_slice(&*key).map_err(|e| Error::Crypto(e.to_string()))?;

        Ok(Self {
            inner,
            cipher,
            hmac,
            salt,
            unconsumed: Vec::with_capacity(UNCONSUMED_CAP),
            flushed: false,
        })
    }

    fn drain_full_blocks(&mut self) -> Result<()> {
        let full_len = self.unconsumed.len() - (self.unconsumed.len() % BLOCK);
        if full_len == 0 {
            return Ok(());
        }
        let mut ciphertext = self.unconsumed[..full_len].to_vec();
        for block in ciphertext.chunks_mut(BLOCK) {
            self.cipher.encrypt_block_mut(cipher::generic_array::GenericArray::from_mut_slice(block));
        }
        self.inner.write_all(&ciphertext)?;
        self.unconsumed.drain(..full_len);
        Ok(())
    }
}

impl<W> Drop for CryptoWriteStream<W> {
    fn drop(&mut self) {
        self.salt.zeroize();
        self.unconsumed.zeroize();
    }
}

impl<W: WriteStream + RewindableWrite> WriteStream for CryptoWriteStream<W> {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.hmac.update(buf);
        self.unconsumed.extend_from_slice(buf);
        self.drain_full_blocks()
    }

    fn flush(&mut self) -> Result<()> {
        if self.flushed {
            return self.inner.flush();
        }

        let unaligned = self.unconsumed.len() as u8;
        let mut tail = [0u8; BLOCK];
        tail[..self.unconsumed.len()].copy_from_slice(&self.unconsumed);
        self.cipher
            .encrypt_block_mut(cipher::generic_array::GenericArray::from_mut_slice(&mut tail));
        self.inner.write_all(&tail)?;
        self.unconsumed.clear();

        self.salt[0] = (unaligned << 4) | (self.salt[0] & 0x0f);
        let tag = self.hmac.clone().finalize().into_bytes();

        let mut header = [0u8; SALT_LEN + HMAC_LEN];
        header[..SALT_LEN].copy_from_slice(&self.salt);
        header[SALT_LEN..].copy_from_slice(&tag);
        self.inner.rewind_write(&header)?;

        self.flushed = true;
        self.inner.flush()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

pub struct CryptoReadStream<R> {
    inner: R,
    cipher: Decryptor,
    hmac: HmacSha256,
    expected_tag: [u8; HMAC_LEN],
    unaligned: u8,
    held: Option<[u8; BLOCK]>,
    plain: Vec<u8>,
    plain_pos: usize,
    eof: bool,
    drained: bool,
}

impl<R: ReadStream> CryptoReadStream<R> {
    pub fn new(mut inner: R, password: &[u8]) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        inner.read_exact(&mut salt)?;
        let mut expected_tag = [0u8; HMAC_LEN];
        inner.read_exact(&mut expected_tag)?;
        let mut iv = [0u8; IV_LEN];
        inner.read_exact(&mut iv)?;

        let unaligned = (salt[0] >> 4) & 0x0f;
        salt[0] &= 0x0f;

        let key = derive_key(password, &salt);
        let cipher = Decryptor::new_from_slices(&*key, &iv).map_err(|e| Error::Crypto(e.to_string()))?;
        let hmac = HmacSha256::new_from_slice(&*key).map_err(|e| Error::Crypto(e.to_string()))?;

        let mut stream = Self {
            inner,
            cipher,
            hmac,
            expected_tag,
            unaligned,
            held: None,
            plain: Vec::new(),
            plain_pos: 0,
            eof: false,
            drained: false,
        };
        stream.prime()?;
        Ok(stream)
    }

    fn prime(&mut self) -> Result<()> {
        let mut first = [0u8; BLOCK];
        match self.inner.read_exact(&mut first) {
            Ok(()) => {
                self.held = Some(first);
                Ok(())
            }
            Err(e) if e.is_eof() => {
                // Empty archive content still carries a padding-only tail
                // block from the writer; a header with nothing after it is
                // a truncated/malformed stream.
                Err(Error::UnexpectedEof)
            }
            Err(e) => Err(e),
        }
    }

    fn advance(&mut self) -> Result<()> {
        if self.eof {
            return Ok(());
        }
        let held = self.held.take().expect("advance called with no held block");
        let mut next = [0u8; BLOCK];
        let n = self.inner.read_at_most(&mut next)?;

        if n == BLOCK {
            let mut block = held;
            self.cipher
                .decrypt_block_mut(cipher::generic_array::GenericArray::from_mut_slice(&mut block));
            self.hmac.update(&block);
            self.plain.extend_from_slice(&block);
            self.held = Some(next);
        } else if n == 0 {
            let mut block = held;
            self.cipher
                .decrypt_block_mut(cipher::generic_array::GenericArray::from_mut_slice(&mut block));
            let real = self.unaligned as usize;
            self.hmac.update(&block[..real]);
            self.plain.extend_from_slice(&block[..real]);
            self.eof = true;
            if self.plain_pos == self.plain.len() {
                self.drained = true;
            }
        } else {
            // A short, non-empty read here means the stream ends mid-block:
            // truncation, not a format problem, so it reports the same way
            // the all-or-nothing EOF case below the padding does.
            return Err(Error::UnexpectedEof);
        }
        Ok(())
    }
}

impl<R: ReadStream> ReadStream for CryptoReadStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        while self.plain_pos == self.plain.len() {
            if self.eof {
                self.drained = true;
                return Ok(0);
            }
            self.advance()?;
        }
        let avail = &self.plain[self.plain_pos..];
        let n = avail.len().min(buf.len());
        buf[..n].copy_from_slice(&avail[..n]);
        self.plain_pos += n;
        if self.eof && self.plain_pos == self.plain.len() {
            self.drained = true;
        }
        Ok(n)
    }

    fn verify(&mut self) -> Result<()> {
        if !self.drained {
            return Err(Error::Crypto("verify() called before stream fully consumed".into()));
        }
        self.hmac
            .clone()
            .verify_slice(&self.expected_tag)
            .map_err(|_| Error::Integrity)
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

/// The static capability that lets `CryptoWriteStream` rewrite its header
/// in place at flush time. Only a seekable (regular-file) sink can satisfy
/// this; sockets, pipes, and stdout cannot back an encrypted archive.
pub trait RewindableWrite {
    fn rewind_write(&mut self, data: &[u8]) -> Result<()>;
}

impl RewindableWrite for FileWriteStream {
    fn rewind_write(&mut self, data: &[u8]) -> Result<()> {
        self.rewrite_head(data)
    }
}

/// Marker re-export so callers constructing the read-side stack don't need
/// to know `CryptoReadStream` works over any `ReadStream`, including a
/// `FileReadStream`.
pub type FileCryptoReadStream = CryptoReadStream<FileReadStream>;
pub type FileCryptoWriteStream = CryptoWriteStream<FileWriteStream>;
