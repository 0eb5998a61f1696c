//! Hardware attestation quote.
//!
//! A quote is a 432-byte little-endian body (48-byte header followed by the
//! 384-byte enclave report) and a length-prefixed signature. The body layout
//! is fixed by the hardware; field accessors here are the only place that
//! layout is known.
//!
//! # Security
//!
//! Parsing only validates structure. Whether the quote is trustworthy is
//! decided by the quote and signature verifiers in `cds-core`.

use bitflags::bitflags;
use zerocopy::{
    FromBytes, Immutable, KnownLayout, Unaligned,
    byteorder::little_endian::{U16, U32, U64},
};

use crate::ProtoError;

/// Length of the signed quote body (header + report body).
///
/// This is also the prefix the attestation authority copies into its report.
pub const QUOTE_BODY_LEN: usize = 432;

/// Length of the signature length field following the body.
const SIGNATURE_LEN_FIELD: usize = 4;

bitflags! {
    /// Enclave attribute flags from the report body.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttributeFlags: u64 {
        /// Enclave has been initialized.
        const INITTED = 0x0000_0000_0000_0001;
        /// Enclave runs in debug mode; its memory is readable by the host.
        const DEBUG = 0x0000_0000_0000_0002;
        /// Enclave runs in 64-bit mode.
        const MODE64BIT = 0x0000_0000_0000_0004;
        /// Enclave may access the provisioning key.
        const PROVISION_KEY = 0x0000_0000_0000_0010;
        /// Enclave may access the launch key.
        const EINITTOKEN_KEY = 0x0000_0000_0000_0020;
        /// Key separation and sharing is enabled.
        const KSS = 0x0000_0000_0000_0080;
    }
}

/// Raw on-wire quote body.
#[derive(Clone, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct RawQuoteBody {
    version: U16,
    sign_type: U16,
    epid_group_id: [u8; 4],
    qe_svn: U16,
    pce_svn: U16,
    xeid: U32,
    basename: [u8; 32],
    cpu_svn: [u8; 16],
    misc_select: U32,
    reserved1: [u8; 28],
    flags: U64,
    xfrm: U64,
    mrenclave: [u8; 32],
    reserved2: [u8; 32],
    mrsigner: [u8; 32],
    reserved3: [u8; 96],
    isv_prod_id: U16,
    isv_svn: U16,
    reserved4: [u8; 60],
    report_data: [u8; 64],
}

const _: () = assert!(size_of::<RawQuoteBody>() == QUOTE_BODY_LEN);

/// Parsed hardware attestation quote.
///
/// Keeps the full raw bytes alongside the decoded body so the signed report
/// can be cross-checked byte for byte.
#[derive(Clone)]
pub struct Quote {
    body: RawQuoteBody,
    flags: AttributeFlags,
    raw: Vec<u8>,
}

impl Quote {
    /// Parse and structurally validate a raw quote.
    ///
    /// # Errors
    ///
    /// - `QuoteTooShort` if the body or signature length field is missing
    /// - `UnknownQuoteVersion` unless the version is 1 or 2
    /// - `UnknownSignType` unless the sign type is 0 or 1
    /// - `NonZeroReserved` if any reserved region carries data
    /// - `InvalidFlags` for unknown attribute bits or an enclave that is not
    ///   initialized 64-bit
    /// - `SignatureLength` if the declared signature length does not match
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtoError> {
        let needed = QUOTE_BODY_LEN + SIGNATURE_LEN_FIELD;
        let (body, rest) = RawQuoteBody::read_from_prefix(bytes)
            .map_err(|_| ProtoError::QuoteTooShort { needed, actual: bytes.len() })?;
        let (signature_len, signature) = U32::read_from_prefix(rest)
            .map_err(|_| ProtoError::QuoteTooShort { needed, actual: bytes.len() })?;

        let version = body.version.get();
        if !(1..=2).contains(&version) {
            return Err(ProtoError::UnknownQuoteVersion(version));
        }

        let sign_type = body.sign_type.get();
        if sign_type > 1 {
            return Err(ProtoError::UnknownSignType(sign_type));
        }

        for (name, region) in [
            ("reserved1", &body.reserved1[..]),
            ("reserved2", &body.reserved2[..]),
            ("reserved3", &body.reserved3[..]),
            ("reserved4", &body.reserved4[..]),
        ] {
            if region.iter().any(|&b| b != 0) {
                return Err(ProtoError::NonZeroReserved(name));
            }
        }

        let raw_flags = body.flags.get();
        let flags = AttributeFlags::from_bits(raw_flags)
            .filter(|f| f.contains(AttributeFlags::INITTED | AttributeFlags::MODE64BIT))
            .ok_or(ProtoError::InvalidFlags { flags: raw_flags })?;

        let declared = signature_len.get() as usize;
        if declared != signature.len() {
            return Err(ProtoError::SignatureLength { declared, present: signature.len() });
        }

        Ok(Self { body, flags, raw: bytes.to_vec() })
    }

    /// Quote format version.
    pub fn version(&self) -> u16 {
        self.body.version.get()
    }

    /// Signature type: 0 unlinkable, 1 linkable.
    pub fn sign_type(&self) -> u16 {
        self.body.sign_type.get()
    }

    /// Whether the quote signature is linkable.
    pub fn is_linkable(&self) -> bool {
        self.sign_type() == 1
    }

    /// EPID group the platform belongs to.
    pub fn epid_group_id(&self) -> [u8; 4] {
        self.body.epid_group_id
    }

    /// Quoting enclave security version.
    pub fn qe_svn(&self) -> u16 {
        self.body.qe_svn.get()
    }

    /// Provisioning certification enclave security version.
    pub fn pce_svn(&self) -> u16 {
        self.body.pce_svn.get()
    }

    /// Extended EPID group id.
    pub fn xeid(&self) -> u32 {
        self.body.xeid.get()
    }

    /// Quote basename.
    pub fn basename(&self) -> &[u8; 32] {
        &self.body.basename
    }

    /// CPU security version.
    pub fn cpu_svn(&self) -> &[u8; 16] {
        &self.body.cpu_svn
    }

    /// Miscellaneous select bits.
    pub fn misc_select(&self) -> u32 {
        self.body.misc_select.get()
    }

    /// Enclave attribute flags.
    pub fn flags(&self) -> AttributeFlags {
        self.flags
    }

    /// Extended feature request mask.
    pub fn xfrm(&self) -> u64 {
        self.body.xfrm.get()
    }

    /// Code measurement of the enclave image.
    pub fn mrenclave(&self) -> &[u8; 32] {
        &self.body.mrenclave
    }

    /// Measurement of the enclave signing key.
    pub fn mrsigner(&self) -> &[u8; 32] {
        &self.body.mrsigner
    }

    /// Enclave product id.
    pub fn isv_prod_id(&self) -> u16 {
        self.body.isv_prod_id.get()
    }

    /// Enclave security version.
    pub fn isv_svn(&self) -> u16 {
        self.body.isv_svn.get()
    }

    /// Application-defined report data.
    pub fn report_data(&self) -> &[u8; 64] {
        &self.body.report_data
    }

    /// Whether the enclave was launched in debug mode.
    pub fn is_debug(&self) -> bool {
        self.flags.contains(AttributeFlags::DEBUG)
    }

    /// Quote signature bytes.
    pub fn signature(&self) -> &[u8] {
        &self.raw[QUOTE_BODY_LEN + SIGNATURE_LEN_FIELD..]
    }

    /// The full quote exactly as received.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }
}

impl std::fmt::Debug for Quote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Quote")
            .field("version", &self.version())
            .field("sign_type", &self.sign_type())
            .field("flags", &self.flags)
            .field("mrenclave", &hex::encode(self.mrenclave()))
            .field("mrsigner", &hex::encode(self.mrsigner()))
            .field("isv_prod_id", &self.isv_prod_id())
            .field("isv_svn", &self.isv_svn())
            .field("signature_len", &self.signature().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use proptest::prelude::*;

    use super::*;

    const FLAGS_OFFSET: usize = 96;
    const MRENCLAVE_OFFSET: usize = 112;
    const REPORT_DATA_OFFSET: usize = 368;

    fn quote_bytes(flags: u64, signature: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0u8; QUOTE_BODY_LEN];
        bytes[0..2].copy_from_slice(&2u16.to_le_bytes());
        bytes[FLAGS_OFFSET..FLAGS_OFFSET + 8].copy_from_slice(&flags.to_le_bytes());
        bytes[MRENCLAVE_OFFSET..MRENCLAVE_OFFSET + 32].fill(0xAB);
        bytes[REPORT_DATA_OFFSET..REPORT_DATA_OFFSET + 64].fill(0xCD);
        bytes.extend_from_slice(&(signature.len() as u32).to_le_bytes());
        bytes.extend_from_slice(signature);
        bytes
    }

    fn production_flags() -> u64 {
        (AttributeFlags::INITTED | AttributeFlags::MODE64BIT).bits()
    }

    #[test]
    fn parses_fields_at_expected_offsets() {
        let bytes = quote_bytes(production_flags(), &[1, 2, 3]);
        let quote = Quote::from_bytes(&bytes).unwrap();

        assert_eq!(quote.version(), 2);
        assert_eq!(quote.mrenclave(), &[0xAB; 32]);
        assert_eq!(quote.report_data(), &[0xCD; 64]);
        assert_eq!(quote.signature(), &[1, 2, 3]);
        assert_eq!(quote.raw_bytes(), &bytes[..]);
        assert!(!quote.is_debug());
    }

    #[test]
    fn debug_flag_is_exposed() {
        let flags = production_flags() | AttributeFlags::DEBUG.bits();
        let quote = Quote::from_bytes(&quote_bytes(flags, &[])).unwrap();
        assert!(quote.is_debug());
    }

    #[test]
    fn rejects_truncated_quote() {
        let bytes = quote_bytes(production_flags(), &[]);
        let result = Quote::from_bytes(&bytes[..QUOTE_BODY_LEN]);
        assert!(matches!(result, Err(ProtoError::QuoteTooShort { .. })));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = quote_bytes(production_flags(), &[]);
        bytes[0..2].copy_from_slice(&3u16.to_le_bytes());
        assert_eq!(Quote::from_bytes(&bytes).unwrap_err(), ProtoError::UnknownQuoteVersion(3));
    }

    #[test]
    fn rejects_unknown_sign_type() {
        let mut bytes = quote_bytes(production_flags(), &[]);
        bytes[2..4].copy_from_slice(&2u16.to_le_bytes());
        assert_eq!(Quote::from_bytes(&bytes).unwrap_err(), ProtoError::UnknownSignType(2));
    }

    #[test]
    fn rejects_nonzero_reserved_region() {
        let mut bytes = quote_bytes(production_flags(), &[]);
        bytes[70] = 1; // inside reserved1
        assert_eq!(
            Quote::from_bytes(&bytes).unwrap_err(),
            ProtoError::NonZeroReserved("reserved1")
        );
    }

    #[test]
    fn rejects_uninitialized_enclave() {
        let bytes = quote_bytes(AttributeFlags::MODE64BIT.bits(), &[]);
        assert!(matches!(Quote::from_bytes(&bytes), Err(ProtoError::InvalidFlags { .. })));
    }

    #[test]
    fn rejects_unknown_flag_bits() {
        let bytes = quote_bytes(production_flags() | 0x100, &[]);
        assert!(matches!(Quote::from_bytes(&bytes), Err(ProtoError::InvalidFlags { .. })));
    }

    #[test]
    fn rejects_signature_length_mismatch() {
        let mut bytes = quote_bytes(production_flags(), &[9, 9]);
        bytes.push(9);
        assert_eq!(
            Quote::from_bytes(&bytes).unwrap_err(),
            ProtoError::SignatureLength { declared: 2, present: 3 }
        );
    }

    #[test]
    fn debug_output_omits_report_data() {
        let quote = Quote::from_bytes(&quote_bytes(production_flags(), &[])).unwrap();
        let output = format!("{quote:?}");
        assert!(output.contains(&"ab".repeat(32)));
        assert!(!output.contains(&"cd".repeat(64)));
    }

    #[test]
    fn header_fields_are_little_endian() {
        let mut bytes = quote_bytes(production_flags(), &[]);
        bytes[..16].copy_from_slice(&hex!("0100 0100 0b0b0000 0700 0a00 efbeadde"));
        let quote = Quote::from_bytes(&bytes).unwrap();

        assert_eq!(quote.version(), 1);
        assert!(quote.is_linkable());
        assert_eq!(quote.epid_group_id(), [0x0b, 0x0b, 0, 0]);
        assert_eq!(quote.qe_svn(), 7);
        assert_eq!(quote.pce_svn(), 10);
        assert_eq!(quote.xeid(), 0xdead_beef);
    }

    proptest! {
        #[test]
        fn prop_accepted_quote_covers_whole_input(
            bytes in prop::collection::vec(any::<u8>(), 0..600),
        ) {
            if let Ok(quote) = Quote::from_bytes(&bytes) {
                prop_assert_eq!(quote.raw_bytes(), &bytes[..]);
                prop_assert_eq!(QUOTE_BODY_LEN + 4 + quote.signature().len(), bytes.len());
            }
        }

        #[test]
        fn prop_signature_is_carried_verbatim(
            signature in prop::collection::vec(any::<u8>(), 0..256),
        ) {
            let quote = Quote::from_bytes(&quote_bytes(production_flags(), &signature)).unwrap();
            prop_assert_eq!(quote.signature(), &signature[..]);
        }
    }
}
