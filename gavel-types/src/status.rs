//! Derived auction status.
//!
//! Everything here is a pure function of an [`AuctionView`], a reference
//! timestamp and the acting identity.

use serde::{Deserialize, Serialize};

use crate::{AuctionView, Identity, Timestamp};

/// Number of distinct co-signatures required before an auction may be ended.
pub const QUORUM: u64 = 2;

/// Flags derived from an auction for one caller at one moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Status {
    /// Seconds until bidding closes; zero or negative once closed.
    pub time_remaining: i64,
    pub cancelable: bool,
    pub signable: bool,
    pub endable: bool,
    pub biddable: bool,
}

pub fn evaluate(view: &AuctionView, reference: Timestamp, caller: Identity) -> Status {
    let time_remaining = reference.remaining_until(view.end_time);
    Status {
        time_remaining,
        cancelable: !view.cancelled && view.sig_count == 0,
        signable: is_signer(view, caller) && time_remaining <= 0 && !view.ended,
        endable: view.sig_count >= QUORUM,
        biddable: caller != view.beneficiary
            && caller != view.ttp
            && time_remaining > 0
            && !view.cancelled,
    }
}

/// Is `caller` one of the parties eligible to co-sign the close-out?
///
/// The null identity never is, even when `ttp` or `highest_bidder` are unset.
pub fn is_signer(view: &AuctionView, caller: Identity) -> bool {
    !caller.is_null()
        && (caller == view.beneficiary || caller == view.highest_bidder || caller == view.ttp)
}

#[cfg(test)]
mod tests {
    use quickcheck::{Arbitrary, Gen, quickcheck};

    use super::{QUORUM, evaluate, is_signer};
    use crate::{AuctionView, Identity, Timestamp, Wei};

    const BENEFICIARY: Identity = id(0xb0);
    const BIDDER: Identity = id(0xb1);
    const TTP: Identity = id(0x77);
    const OTHER: Identity = id(0x0e);

    const fn id(n: u8) -> Identity {
        Identity::from_bytes([n; 20])
    }

    fn closed_auction() -> AuctionView {
        AuctionView {
            address: id(0xaa),
            beneficiary: BENEFICIARY,
            ttp: TTP,
            end_time: Timestamp::from(1000),
            highest_bid: Wei::from(10u64),
            highest_bidder: BIDDER,
            sig_count: 0,
            cancelled: false,
            ended: false,
        }
    }

    #[derive(Debug, Clone)]
    struct Arb(AuctionView, Timestamp, Identity);

    impl Arbitrary for Arb {
        fn arbitrary(g: &mut Gen) -> Self {
            let pool = [BENEFICIARY, BIDDER, TTP, OTHER, Identity::NULL];
            let pick = |g: &mut Gen| *g.choose(&pool).expect("non-empty pool");
            let (cancelled, ended) = match u8::arbitrary(g) % 3 {
                0 => (false, false),
                1 => (true, false),
                _ => (false, true),
            };
            let view = AuctionView {
                address: id(0xaa),
                beneficiary: pick(g),
                ttp: pick(g),
                end_time: Timestamp::from(u64::from(u16::arbitrary(g))),
                highest_bid: Wei::from(u64::arbitrary(g)),
                highest_bidder: pick(g),
                sig_count: u64::from(u8::arbitrary(g) % 5),
                cancelled,
                ended,
            };
            Arb(view, Timestamp::from(u64::from(u16::arbitrary(g))), pick(g))
        }
    }

    quickcheck! {
        fn evaluation_is_pure(a: Arb) -> bool {
            evaluate(&a.0, a.1, a.2) == evaluate(&a.0.clone(), a.1, a.2)
        }

        fn cancelable_iff_unsigned_and_live(a: Arb) -> bool {
            let s = evaluate(&a.0, a.1, a.2);
            s.cancelable == (!a.0.cancelled && a.0.sig_count == 0)
        }

        fn endable_iff_quorum(a: Arb) -> bool {
            evaluate(&a.0, a.1, a.2).endable == (a.0.sig_count >= QUORUM)
        }

        fn never_biddable_by_beneficiary_or_ttp(a: Arb) -> bool {
            let v = &a.0;
            !evaluate(v, a.1, v.beneficiary).biddable && !evaluate(v, a.1, v.ttp).biddable
        }

        fn signable_only_after_close(a: Arb) -> bool {
            let s = evaluate(&a.0, a.1, a.2);
            !s.signable || (s.time_remaining <= 0 && !a.0.ended && is_signer(&a.0, a.2))
        }

        fn bidding_and_signing_exclusive_in_time(a: Arb) -> bool {
            let s = evaluate(&a.0, a.1, a.2);
            !(s.biddable && s.signable)
        }
    }

    #[test]
    fn cancelable_boundaries() {
        let mut v = closed_auction();
        let now = Timestamp::from(10);
        assert!(evaluate(&v, now, OTHER).cancelable);
        v.sig_count = 1;
        assert!(!evaluate(&v, now, OTHER).cancelable);
        v.sig_count = 0;
        v.cancelled = true;
        assert!(!evaluate(&v, now, OTHER).cancelable);
    }

    #[test]
    fn endable_boundaries() {
        let mut v = closed_auction();
        let now = Timestamp::from(2000);
        for (n, expected) in [(0, false), (1, false), (2, true), (3, true)] {
            v.sig_count = n;
            assert_eq!(evaluate(&v, now, OTHER).endable, expected, "sig_count = {n}")
        }
    }

    #[test]
    fn signable_after_end_time() {
        let v = closed_auction();
        let now = Timestamp::from(1500);
        for who in [BENEFICIARY, BIDDER, TTP] {
            let s = evaluate(&v, now, who);
            assert_eq!(s.time_remaining, -500);
            assert!(s.signable, "{who} should be able to sign")
        }
        assert!(!evaluate(&v, now, OTHER).signable);
        assert!(!evaluate(&v, now, Identity::NULL).signable);
    }

    #[test]
    fn signable_requires_closed_bidding_and_not_ended() {
        let mut v = closed_auction();
        assert!(!evaluate(&v, Timestamp::from(999), BENEFICIARY).signable);
        assert!(evaluate(&v, Timestamp::from(1000), BENEFICIARY).signable);
        v.ended = true;
        assert!(!evaluate(&v, Timestamp::from(1500), BENEFICIARY).signable);
    }

    #[test]
    fn null_ttp_is_not_a_signer() {
        let mut v = closed_auction();
        v.ttp = Identity::NULL;
        assert!(!is_signer(&v, Identity::NULL));
        assert!(!evaluate(&v, Timestamp::from(1500), Identity::NULL).signable);
    }

    #[test]
    fn biddable_rules() {
        let mut v = closed_auction();
        let open = Timestamp::from(500);
        assert!(evaluate(&v, open, OTHER).biddable);
        assert!(evaluate(&v, open, BIDDER).biddable);
        assert!(!evaluate(&v, open, BENEFICIARY).biddable);
        assert!(!evaluate(&v, open, TTP).biddable);
        assert!(!evaluate(&v, Timestamp::from(1000), OTHER).biddable);
        v.cancelled = true;
        assert!(!evaluate(&v, open, OTHER).biddable);
    }
}
