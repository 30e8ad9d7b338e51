#![allow(non_camel_case_types)]

enum_builder! {
    /// The `TlsVersion` TLS protocol enum.  Values in this enum are taken
    /// from the various RFCs covering TLS, and are listed by IANA.
    /// The `Unknown` item is used when processing unrecognised ordinals.
    @U16
    pub enum TlsVersion {
        SSLv3 => (0x0300, "SSL 3.0"),
        TLSv1_0 => (0x0301, "TLS 1.0"),
        TLSv1_1 => (0x0302, "TLS 1.1"),
        TLSv1_2 => (0x0303, "TLS 1.2"),
        TLSv1_3 => (0x0304, "TLS 1.3"),
    }
}

enum_builder! {
    /// The `CipherSuite` TLS protocol enum, limited to the suites a
    /// mainstream TLS stack negotiates.
    /// See <https://www.iana.org/assignments/tls-parameters/tls-parameters.xhtml#tls-parameters-4>
    @U16
    pub enum CipherSuite {
        TLS_RSA_WITH_RC4_128_SHA => (0x0005, "TLS_RSA_WITH_RC4_128_SHA"),
        TLS_RSA_WITH_3DES_EDE_CBC_SHA => (0x000a, "TLS_RSA_WITH_3DES_EDE_CBC_SHA"),
        TLS_RSA_WITH_AES_128_CBC_SHA => (0x002f, "TLS_RSA_WITH_AES_128_CBC_SHA"),
        TLS_RSA_WITH_AES_256_CBC_SHA => (0x0035, "TLS_RSA_WITH_AES_256_CBC_SHA"),
        TLS_RSA_WITH_AES_128_CBC_SHA256 => (0x003c, "TLS_RSA_WITH_AES_128_CBC_SHA256"),
        TLS_RSA_WITH_AES_128_GCM_SHA256 => (0x009c, "TLS_RSA_WITH_AES_128_GCM_SHA256"),
        TLS_RSA_WITH_AES_256_GCM_SHA384 => (0x009d, "TLS_RSA_WITH_AES_256_GCM_SHA384"),
        TLS_AES_128_GCM_SHA256 => (0x1301, "TLS_AES_128_GCM_SHA256"),
        TLS_AES_256_GCM_SHA384 => (0x1302, "TLS_AES_256_GCM_SHA384"),
        TLS_CHACHA20_POLY1305_SHA256 => (0x1303, "TLS_CHACHA20_POLY1305_SHA256"),
        TLS_ECDHE_ECDSA_WITH_RC4_128_SHA => (0xc007, "TLS_ECDHE_ECDSA_WITH_RC4_128_SHA"),
        TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA => (0xc009, "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA"),
        TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA => (0xc00a, "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA"),
        TLS_ECDHE_RSA_WITH_RC4_128_SHA => (0xc011, "TLS_ECDHE_RSA_WITH_RC4_128_SHA"),
        TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA => (0xc012, "TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA"),
        TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA => (0xc013, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA"),
        TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA => (0xc014, "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA"),
        TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256 => (0xc023, "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256"),
        TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256 => (0xc027, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256"),
        TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 => (0xc02b, "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256"),
        TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 => (0xc02c, "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384"),
        TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 => (0xc02f, "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256"),
        TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 => (0xc030, "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384"),
        TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305 => (0xcca8, "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305"),
        TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305 => (0xcca9, "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305"),
    }
}

/// Suite involves elliptic curve Diffie-Hellman.
const SUITE_ECDHE: u8 = 1 << 0;
/// Suite involves an ECDSA signature, otherwise it is RSA based.
const SUITE_ECDSA: u8 = 1 << 1;
/// Suite may only be negotiated with TLS 1.2.
const SUITE_TLS12: u8 = 1 << 2;
/// Suite may only be negotiated with TLS 1.3.
const SUITE_TLS13: u8 = 1 << 3;

impl CipherSuite {
    fn flags(&self) -> Option<u8> {
        use CipherSuite::*;

        let flags = match self {
            TLS_AES_128_GCM_SHA256 | TLS_AES_256_GCM_SHA384 | TLS_CHACHA20_POLY1305_SHA256 => {
                SUITE_TLS13
            }
            TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305
            | TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256
            | TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384
            | TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256 => SUITE_ECDHE | SUITE_TLS12,
            TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305
            | TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256
            | TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384
            | TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256 => SUITE_ECDHE | SUITE_ECDSA | SUITE_TLS12,
            TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA
            | TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA
            | TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA
            | TLS_ECDHE_RSA_WITH_RC4_128_SHA => SUITE_ECDHE,
            TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA
            | TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA
            | TLS_ECDHE_ECDSA_WITH_RC4_128_SHA => SUITE_ECDHE | SUITE_ECDSA,
            TLS_RSA_WITH_AES_128_GCM_SHA256
            | TLS_RSA_WITH_AES_256_GCM_SHA384
            | TLS_RSA_WITH_AES_128_CBC_SHA256 => SUITE_TLS12,
            TLS_RSA_WITH_AES_128_CBC_SHA
            | TLS_RSA_WITH_AES_256_CBC_SHA
            | TLS_RSA_WITH_3DES_EDE_CBC_SHA
            | TLS_RSA_WITH_RC4_128_SHA => 0,
            Unknown(_) => return None,
        };

        Some(flags)
    }

    /// Uses an ECDHE key agreement.
    pub fn is_ecdhe(&self) -> bool {
        self.flags()
            .is_some_and(|f| f & (SUITE_ECDHE | SUITE_TLS13) == SUITE_ECDHE)
    }

    /// Authenticates with RSA.
    pub fn is_rsa(&self) -> bool {
        self.flags()
            .is_some_and(|f| f & (SUITE_ECDSA | SUITE_TLS13) == 0)
    }

    /// Authenticates with ECDSA.
    pub fn is_ecdsa(&self) -> bool {
        self.flags()
            .is_some_and(|f| f & (SUITE_ECDSA | SUITE_TLS13) == SUITE_ECDSA)
    }

    /// Only valid with TLS 1.2.
    pub fn is_tls12(&self) -> bool {
        self.flags().is_some_and(|f| f & SUITE_TLS12 != 0)
    }

    /// Only valid with TLS 1.3.
    pub fn is_tls13(&self) -> bool {
        self.flags().is_some_and(|f| f & SUITE_TLS13 != 0)
    }
}
