//! Solidity surfaces of the registry and auction contracts.

use alloy::sol;

sol! {
    /// Factory contract keeping the list of deployed auctions.
    #[sol(rpc)]
    contract AuctionMaker {
        event AuctionCreated(address auction, address beneficiary, address ttp);

        function getAuction() external view returns (address[] memory);
        function createAuction(uint256 biddingTime, address ttp) external returns (address);
    }

    /// One escrowing auction closed out by a co-signature quorum.
    #[sol(rpc)]
    contract SimpleAuction {
        event LogBid(address bidder, uint256 bid, address highestBidder, uint256 highestBid);

        function beneficiary() external view returns (address);
        function ttp() external view returns (address);
        function highestBidder() external view returns (address);
        function getHighestBid() external view returns (uint256);
        function auctionEndTime() external view returns (uint256);
        function sigCount() external view returns (uint256);
        function cancelled() external view returns (bool);
        function ended() external view returns (bool);
        function fundsByBidder(address bidder) external view returns (uint256);

        function bid() external payable;
        function cancelAuction() external;
        function sign() external;
        function end() external;
        function withdraw() external;
    }
}
