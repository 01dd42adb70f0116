// Contract bindings. The presale contract itself is deployed separately;
// only the interface the dashboard calls is declared here.
use ethers::contract::abigen;

abigen!(
    TokenIco,
    r#"[
        struct SaleTransaction { address user; address tokenIn; address tokenOut; uint256 amountIn; uint256 amountOut; uint256 timestamp; string transactionType; }
        struct StakeEntry { uint256 id; uint256 amount; uint256 startTime; uint256 lockPeriod; uint256 lastRewardCalculation; uint256 pendingRewards; bool active; }
        function owner() external view returns (address)
        function getContractInfo() external view returns (address tokenAddress, uint256 tokenBalance, uint256 ethPrice, uint256 stablecoinPrice, uint256 totalSold, address usdtAddr, address usdcAddr, uint256 usdtTokenRatio, uint256 usdcTokenRatio)
        function getTokenBalances() external view returns (uint256 tokenBalance, uint256 usdtBalance, uint256 usdcBalance)
        function getTotalPenaltyCollected() external view returns (uint256)
        function getUserTransactions(address user) external view returns (SaleTransaction[])
        function getAllTransactions() external view returns (SaleTransaction[])
        function getUserStakes(address user) external view returns (StakeEntry[])
        function getStakeDetails(uint256 stakeId) external view returns (uint256 amount, uint256 startTime, uint256 lockPeriod, uint256 pendingRewards, uint256 timeRemaining, bool active)
        function getStakingInfo() external view returns (uint256 baseApyRate, uint256 minStakingAmount, uint256 totalTokensStaked, uint256 totalRewardsPaid, uint256 numberOfStakers)
        function getUserStakingInfo(address user) external view returns (uint256 totalUserStaked, uint256 totalPendingRewards, uint256 activeStakesCount)
        function getReferralInfo(address user) external view returns (address referrer, uint256 totalReferrals, uint256 totalRewardsEarned, uint256 rewardPercentage)
        function getUserReferrals(address user) external view returns (address[])
        function buyWithETH() external payable
        function buyWithUSDT(uint256 usdtAmount) external
        function buyWithUSDC(uint256 usdcAmount) external
        function buyUSDT() external payable
        function buyUSDC() external payable
        function updateStablecoinPrice(uint256 newPrice) external
        function updateTokenPrice(uint256 newPrice) external
        function updateUSDT(address newAddress, uint256 newRatio) external
        function updateUSDC(address newAddress, uint256 newRatio) external
        function setSaleToken(address newToken) external
        function setBlockStatus(address user, bool blocked) external
        function withdrawTokens(address token, uint256 amount) external
        function stakeTokens(uint256 amount, uint256 lockPeriodDays) external
        function harvestRewards(uint256 stakeId) external
        function unstakeTokens(uint256 stakeId) external
        function unstakeEarly(uint256 stakeId) external
        function updateBaseAPY(uint256 newApy) external
        function updateMinStakeAmount(uint256 newMinAmount) external
        function registerReferrer(address referrer) external
    ]"#
);

abigen!(
    Erc20,
    r#"[
        function totalSupply() external view returns (uint256)
        function balanceOf(address owner) external view returns (uint256)
        function allowance(address owner, address spender) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
    ]"#
);
