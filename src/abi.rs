#[allow(clippy::too_many_arguments)]
pub mod seaport {
    alloy::sol!(
        /// Subset of the Seaport interface needed to decode fulfilled orders.
        #[derive(Debug)]
        interface Seaport {
            struct SpentItem {
                uint8 itemType;
                address token;
                uint256 identifier;
                uint256 amount;
            }

            struct ReceivedItem {
                uint8 itemType;
                address token;
                uint256 identifier;
                uint256 amount;
                address recipient;
            }

            event OrderFulfilled(
                bytes32 orderHash,
                address indexed offerer,
                address indexed zone,
                address recipient,
                SpentItem[] offer,
                ReceivedItem[] consideration
            );
        }
    );
}
