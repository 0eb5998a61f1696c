//! Builder for structurally valid quotes.

use cds_proto::{AttributeFlags, QUOTE_BODY_LEN};

const EPID_GROUP_ID: usize = 4;
const CPU_SVN: usize = 48;
const FLAGS: usize = 96;
const XFRM: usize = 104;
const MRENCLAVE: usize = 112;
const MRSIGNER: usize = 176;
const ISV_PROD_ID: usize = 304;
const ISV_SVN: usize = 306;
const REPORT_DATA: usize = 368;

/// Builds raw quote bytes that `Quote::from_bytes` accepts.
///
/// Defaults: version 2, unlinkable, debug enclave, zero measurement, zero
/// report data, empty signature.
#[derive(Debug, Clone)]
pub struct QuoteBuilder {
    version: u16,
    linkable: bool,
    debug: bool,
    mrenclave: [u8; 32],
    mrsigner: [u8; 32],
    isv_prod_id: u16,
    isv_svn: u16,
    report_data: [u8; 64],
    signature: Vec<u8>,
}

impl QuoteBuilder {
    /// Builder with defaults.
    pub fn new() -> Self {
        Self {
            version: 2,
            linkable: false,
            debug: true,
            mrenclave: [0; 32],
            mrsigner: [0; 32],
            isv_prod_id: 0,
            isv_svn: 0,
            report_data: [0; 64],
            signature: Vec::new(),
        }
    }

    /// Quote version (1 or 2 parse).
    #[must_use]
    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    /// Linkable signature type.
    #[must_use]
    pub fn linkable(mut self, linkable: bool) -> Self {
        self.linkable = linkable;
        self
    }

    /// Set or clear the debug attribute.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Code measurement.
    #[must_use]
    pub fn mrenclave(mut self, mrenclave: [u8; 32]) -> Self {
        self.mrenclave = mrenclave;
        self
    }

    /// Signer measurement.
    #[must_use]
    pub fn mrsigner(mut self, mrsigner: [u8; 32]) -> Self {
        self.mrsigner = mrsigner;
        self
    }

    /// Product id and security version.
    #[must_use]
    pub fn isv(mut self, prod_id: u16, svn: u16) -> Self {
        self.isv_prod_id = prod_id;
        self.isv_svn = svn;
        self
    }

    /// Copy `data` into the start of report data, zero-padding the rest.
    ///
    /// Anything past 64 bytes is dropped.
    #[must_use]
    pub fn report_data(mut self, data: &[u8]) -> Self {
        self.report_data = [0; 64];
        let len = data.len().min(self.report_data.len());
        self.report_data[..len].copy_from_slice(&data[..len]);
        self
    }

    /// Trailing quote signature.
    #[must_use]
    pub fn signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = signature;
        self
    }

    /// Raw quote bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut flags = AttributeFlags::INITTED | AttributeFlags::MODE64BIT;
        if self.debug {
            flags |= AttributeFlags::DEBUG;
        }

        let mut bytes = vec![0u8; QUOTE_BODY_LEN];
        put(&mut bytes, 0, &self.version.to_le_bytes());
        put(&mut bytes, 2, &u16::from(self.linkable).to_le_bytes());
        put(&mut bytes, EPID_GROUP_ID, &[0x0b, 0x0b, 0, 0]);
        put(&mut bytes, CPU_SVN, &[0x02; 16]);
        put(&mut bytes, FLAGS, &flags.bits().to_le_bytes());
        put(&mut bytes, XFRM, &0x07u64.to_le_bytes());
        put(&mut bytes, MRENCLAVE, &self.mrenclave);
        put(&mut bytes, MRSIGNER, &self.mrsigner);
        put(&mut bytes, ISV_PROD_ID, &self.isv_prod_id.to_le_bytes());
        put(&mut bytes, ISV_SVN, &self.isv_svn.to_le_bytes());
        put(&mut bytes, REPORT_DATA, &self.report_data);

        let signature_len = u32::try_from(self.signature.len()).unwrap_or(u32::MAX);
        bytes.extend_from_slice(&signature_len.to_le_bytes());
        bytes.extend_from_slice(&self.signature);
        bytes
    }
}

impl Default for QuoteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn put(bytes: &mut [u8], offset: usize, value: &[u8]) {
    bytes[offset..offset + value.len()].copy_from_slice(value);
}

#[cfg(test)]
mod tests {
    use cds_proto::Quote;

    use super::*;

    #[test]
    fn built_quote_parses_with_requested_fields() {
        let raw = QuoteBuilder::new()
            .debug(false)
            .mrenclave([0xAB; 32])
            .isv(3, 9)
            .report_data(b"server key")
            .signature(vec![1, 2, 3])
            .build();

        let quote = Quote::from_bytes(&raw).unwrap();
        assert!(!quote.is_debug());
        assert_eq!(quote.mrenclave(), &[0xAB; 32]);
        assert_eq!(quote.isv_prod_id(), 3);
        assert_eq!(quote.isv_svn(), 9);
        assert_eq!(&quote.report_data()[..10], b"server key");
        assert_eq!(quote.signature(), &[1, 2, 3]);
    }

    #[test]
    fn debug_is_the_default() {
        let quote = Quote::from_bytes(&QuoteBuilder::new().build()).unwrap();
        assert!(quote.is_debug());
    }
}
