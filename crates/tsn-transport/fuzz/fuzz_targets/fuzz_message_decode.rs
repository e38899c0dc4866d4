#![no_main]

use libfuzzer_sys::fuzz_target;
use tsn_transport::wire::Message;

// Decoding arbitrary bytes must never panic. Anything accepted must re-encode
// to a message of the same kind and stream.
fuzz_target!(|data: &[u8]| {
    if let Some(msg) = Message::decode(&mut &data[..]) {
        let encoded = msg.encode();
        let again = Message::decode(&mut &encoded[..]);
        assert_eq!(again.as_ref().map(Message::kind), Some(msg.kind()));
        assert_eq!(again.map(|m| m.stream_id()), Some(msg.stream_id()));
    }
});
