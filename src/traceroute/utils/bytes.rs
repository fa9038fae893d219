use crate::traceroute::probe::ProbeRequest;

pub trait ToBytes {
    fn to_bytes(&self) -> Vec<u8>;
}

impl ToBytes for ProbeRequest {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = Vec::with_capacity(ProbeRequest::LENGTH);

        bytes.push(self.icmp_type);
        bytes.push(self.icmp_code);
        bytes.extend_from_slice(self.checksum.to_be_bytes().as_ref());
        bytes.extend_from_slice(self.identifier.to_be_bytes().as_ref());
        bytes.extend_from_slice(self.sequence_number.to_be_bytes().as_ref());
        bytes.extend_from_slice(self.timestamp.to_be_bytes().as_ref());

        bytes
    }
}
