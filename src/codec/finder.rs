use core::ops::Range;

use log::debug;

use crate::codec::option::{CoapOption, OptionIter};

/// Locates the first occurrence of option `number` in an option sequence.  Options are stored in
/// ascending order so the scan stops as soon as it passes `number`.  A malformed record ends the
/// search with `None`; [`crate::codec::Message::parse`] has already rejected such sequences for any
/// message it produced.
pub fn find_option(options: &[u8], number: u16) -> Option<CoapOption<'_>> {
    for result in OptionIter::new(options) {
        match result {
            Ok(option) if option.number < number => continue,
            Ok(option) if option.number == number => return Some(option),
            Ok(_) => return None,
            Err(e) => {
                debug!("Option scan for {number} stopped: {e}");
                return None;
            }
        }
    }
    None
}

/// Byte range of the first option `number` value within `options`.
pub fn find_option_range(options: &[u8], number: u16) -> Option<Range<usize>> {
    find_option(options, number).map(|option| option.value_range())
}

/// Every value of a repeatable option, in message order.
pub fn find_option_values(options: &[u8], number: u16) -> impl Iterator<Item = &[u8]> {
    OptionIter::new(options)
        .map_while(Result::ok)
        .skip_while(move |option| option.number < number)
        .take_while(move |option| option.number == number)
        .map(|option| option.value)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::codec::consts::{
        OPT_BLOCK2, OPT_CONTENT_FORMAT, OPT_OBSERVE, OPT_URI_PATH, OPT_URI_QUERY,
    };
    use crate::codec::option::put_option;

    fn encode(options: &[(u16, &[u8])]) -> Vec<u8> {
        let mut buf = vec![0u8; 1024];
        let mut pos = 0;
        let mut previous = 0;
        for (number, value) in options {
            pos += put_option(&mut buf[pos..], previous, *number, value).unwrap();
            previous = *number;
        }
        buf.truncate(pos);
        buf
    }

    #[test]
    fn test_find_first_of_repeated() {
        let options = encode(&[
            (OPT_OBSERVE, &[][..]),
            (OPT_URI_PATH, &b"a"[..]),
            (OPT_URI_PATH, &b"b"[..]),
            (OPT_CONTENT_FORMAT, &[40][..]),
        ]);
        let found = find_option(&options, OPT_URI_PATH).unwrap();
        assert_eq!(found.value, b"a");
        assert_eq!(&options[found.value_range()], b"a");

        let values: Vec<_> = find_option_values(&options, OPT_URI_PATH).collect();
        assert_eq!(values, vec![&b"a"[..], &b"b"[..]]);

        assert_eq!(
            find_option_range(&options, OPT_CONTENT_FORMAT).map(|r| options[r].to_vec()),
            Some(vec![40])
        );
    }

    #[test]
    fn test_missing_option() {
        let options = encode(&[(OPT_URI_PATH, &b"a"[..]), (OPT_BLOCK2, &[0x02][..])]);
        assert!(find_option(&options, OPT_CONTENT_FORMAT).is_none());
        assert!(find_option(&options, OPT_URI_QUERY + 100).is_none());
        assert!(find_option(&[], OPT_URI_PATH).is_none());
        // payload marker first: the region has no options at all
        assert!(find_option(&[0xff, 0xb1, b'a'], OPT_URI_PATH).is_none());
        assert!(find_option_range(&[0xff, 0xb1, b'a'], OPT_URI_PATH).is_none());
        assert_eq!(find_option_values(&options, OPT_OBSERVE).count(), 0);
    }

    #[test]
    fn test_malformed_sequence() {
        // truncated value of the first record
        assert!(find_option(&[0xb4, b'a'], OPT_URI_PATH).is_none());
        assert!(find_option(&[0xf0], OPT_URI_PATH).is_none());
    }

    #[test]
    fn test_random_sequences() {
        let mut rng = StdRng::seed_from_u64(0x636f6170);
        for _ in 0..500 {
            let mut numbers: Vec<u16> = (0..rng.gen_range(1..12))
                .map(|_| rng.gen_range(1..2000))
                .collect();
            numbers.sort_unstable();
            let values: Vec<Vec<u8>> = numbers
                .iter()
                .map(|_| (0..rng.gen_range(0..20)).map(|_| rng.gen()).collect())
                .collect();
            let pairs: Vec<(u16, &[u8])> = numbers
                .iter()
                .zip(&values)
                .map(|(n, v)| (*n, v.as_slice()))
                .collect();
            let options = encode(&pairs);

            let target = numbers[rng.gen_range(0..numbers.len())];
            let expected = pairs.iter().find(|(n, _)| *n == target).unwrap().1;
            assert_eq!(find_option(&options, target).unwrap().value, expected);

            let absent = (1..2000).find(|n| !numbers.contains(n)).unwrap();
            assert!(find_option(&options, absent).is_none());
        }
    }
}
